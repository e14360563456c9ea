#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MODEL_ANSWER: &str =
    r#"[{"instruction": "What is described?", "input": "", "output": "A test page.", "category": "Testing"}]"#;

pub fn qagen_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("qagen");
    path
}

/// A PDF with one Courier text line per page.
pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let pages: Vec<(&str, &str)> = texts.iter().map(|t| ("F1", *t)).collect();
    pdf_with_fonts(&pages)
}

/// One `(font, text)` per page. Only `F1` is declared, so any other font
/// name makes that page unreadable.
pub fn pdf_with_fonts(pages: &[(&str, &str)]) -> Vec<u8> {
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
    for (font, text) in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![(*font).into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn write_pdf(dir: &Path, name: &str, texts: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, pdf_with_pages(texts)).unwrap();
    path
}

/// Test workspace: `in/` for PDFs, `out/` for artifacts, a log file and
/// an index file under the temp root.
pub struct TestEnv {
    pub tmp: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    /// Writes a config pointing generation at `endpoint`.
    pub fn new(endpoint: &str, pool_size: usize, backend: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let input = root.join("in");
        fs::create_dir_all(&input).unwrap();
        let output = root.join("out");
        let log = root.join("logs").join("processing.log");
        let config = root.join("qagen.toml");

        let content = format!(
            r#"[pipeline]
output_dir = "{out}"
pool_size = {pool_size}
page_cap = 2
skip_empty_text = false

[generation]
endpoint_url = "{endpoint}"
model_name = "llama3"
timeout_secs = 10

[index]
backend = "{backend}"
path = "{root}/index.sqlite"
collection = "medical_research"

[embedding]
provider = "hashing"
dims = 64

[logging]
path = "{log}"
level = "info"
"#,
            out = output.display(),
            root = root.display(),
            log = log.display(),
        );
        fs::write(&config, content).unwrap();

        Self {
            tmp,
            input,
            output,
            log,
            config,
        }
    }

    pub fn log_text(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }

    pub fn artifacts(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.output) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Runs the binary with `--config` and returns (stdout, stderr, success).
pub async fn run_qagen(config: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = qagen_binary();
    let output = tokio::process::Command::new(&binary)
        .arg("--config")
        .arg(config)
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap_or_else(|e| panic!("Failed to run qagen binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// A chat endpoint that always answers with [`MODEL_ANSWER`].
pub async fn chat_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3",
            "message": {"role": "assistant", "content": MODEL_ANSWER},
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

pub fn chat_url(server: &MockServer) -> String {
    format!("{}/api/chat", server.uri())
}
