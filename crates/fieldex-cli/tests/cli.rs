use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

fn fieldex() -> Command {
    Command::cargo_bin("fieldex").unwrap()
}

/// An empty config file, so runs never pick up the user's configuration.
fn config_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.json");
    fs::write(&path, "{}").unwrap();
    path
}

/// Write a PDF with one page per entry, each page showing its lines.
fn write_pdf(path: &Path, pages: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut content = String::from("BT /F1 12 Tf 14 TL 72 720 Td");
        for line in lines.iter() {
            content.push_str(&format!(" ({}) Tj T*", line));
        }
        content.push_str(" ET");

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn certificate(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("certificate.pdf");
    write_pdf(
        &path,
        &[
            &[
                "CERTIFICATE OF ORIGIN",
                "Reference No: CO-2024-001234",
                "Date: 2024-01-15",
                "Gross Weight: 1,250.5 KG",
            ],
            &["Terms and conditions"],
        ],
    );
    path
}

#[test]
fn test_fields_prints_defaults() {
    fieldex()
        .args(["fields", "--builtin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"grossWeight\""))
        .stdout(predicate::str::contains("\"Reference No\""));
}

#[test]
fn test_extract_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);

    fieldex()
        .arg("-c")
        .arg(&config)
        .args(["extract", "missing.pdf", "--engine", "embedded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_rejects_malformed_pdf() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    let input = dir.path().join("broken.pdf");
    fs::write(&input, b"this is not a pdf").unwrap();

    fieldex()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .args(["--engine", "embedded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PDF"));
}

#[test]
fn test_extract_embedded_text() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    let input = certificate(&dir);

    let output = fieldex()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .args(["--engine", "embedded"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();

    // The second page has nothing to extract.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["page"], 1);
    assert_eq!(records[0]["referenceNo"], "CO-2024-001234");
    assert_eq!(records[0]["date"], "2024-01-15");
    assert_eq!(records[0]["grossWeight"], "1,250.5 KG");
}

#[test]
fn test_extract_csv_with_custom_fields() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    let input = certificate(&dir);
    let fields = dir.path().join("fields.json");
    fs::write(
        &fields,
        r#"[
            {"id": "1", "key": "ref", "label": "Reference No", "enabled": true},
            {"id": "2", "key": "weight", "label": "Gross Weight", "enabled": false}
        ]"#,
    )
    .unwrap();

    fieldex()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .args(["--engine", "embedded", "--format", "csv", "--fields"])
        .arg(&fields)
        .assert()
        .success()
        .stdout(predicate::str::contains("page,Reference No\n"))
        .stdout(predicate::str::contains("1,CO-2024-001234"))
        .stdout(predicate::str::contains("Gross Weight").not());
}

#[test]
fn test_extract_document_ai_needs_token() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    let input = certificate(&dir);

    fieldex()
        .env_remove("FIELDEX_OCR_TOKEN")
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FIELDEX_OCR_TOKEN"));
}

#[test]
fn test_split_writes_chunks() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    let input = dir.path().join("manifest.pdf");
    write_pdf(&input, &[&["one"], &["two"], &["three"]]);
    let out = dir.path().join("chunks");

    fieldex()
        .arg("-c")
        .arg(&config)
        .arg("split")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .args(["--chunk-size", "2"])
        .assert()
        .success();

    assert!(out.join("manifest-1-2.pdf").exists());
    assert!(out.join("manifest-3-3.pdf").exists());

    let first = Document::load(out.join("manifest-1-2.pdf")).unwrap();
    assert_eq!(first.get_pages().len(), 2);
}

#[test]
fn test_batch_summary() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir);
    certificate(&dir);
    fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();
    let out = dir.path().join("out");
    let pattern = format!("{}/*.pdf", dir.path().display());

    fieldex()
        .arg("-c")
        .arg(&config)
        .args(["batch", &pattern, "--engine", "embedded", "--summary", "--continue-on-error"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,page,Reference No,Date,Gross Weight,error\n"));
    assert!(summary.contains("broken.pdf,error,"));
    assert!(summary.contains("certificate.pdf,success,1,CO-2024-001234"));
    assert!(out.join("certificate.json").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fieldex.json");

    fieldex()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "chunking.chunk_size", "5"])
        .assert()
        .success();

    fieldex()
        .arg("-c")
        .arg(&path)
        .args(["config", "get", "chunking.chunk_size"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));

    fieldex()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "chunking.chunk_size", "0"])
        .assert()
        .failure();

    fieldex()
        .arg("-c")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldex.json"))
        .stdout(predicate::str::contains("exists"));
}
