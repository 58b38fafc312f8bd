use client_from_source::{
    config::GeneratorConfig,
    error::{GeneratorError, ValidationRule},
    generator::Generator,
    serializer::serialize_json,
    sink::{FileSink, MemorySink},
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a temporary crate source tree
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join("src").join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn blog_project() -> TempDir {
    create_test_project(vec![
        ("lib.rs", include_str!("fixtures/blog/lib.rs")),
        ("api.rs", include_str!("fixtures/blog/api.rs")),
        ("auth.rs", include_str!("fixtures/blog/auth.rs")),
        ("common.rs", include_str!("fixtures/blog/common.rs")),
        ("net/mod.rs", include_str!("fixtures/blog/net/mod.rs")),
        ("net/upload.rs", include_str!("fixtures/blog/net/upload.rs")),
    ])
}

/// Drops whitespace and trailing commas so assertions do not depend on line breaking
fn squash(code: &str) -> String {
    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace(",)", ")").replace(",}", "}")
}

fn assert_contains(content: &str, fragment: &str) {
    assert!(
        squash(content).contains(&squash(fragment)),
        "missing `{}` in:\n{}",
        fragment,
        content
    );
}

/// Source without its first line, which names the scanned file
fn body(code: &str) -> &str {
    code.split_once('\n').map_or("", |(_, rest)| rest)
}

fn read(out_dir: &Path, relative: &str) -> String {
    fs::read_to_string(out_dir.join(relative))
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
}

#[test]
fn test_blog_end_to_end_generation() {
    let project = blog_project();
    let out_dir = project.path().join("generated");
    let generator = Generator::new(GeneratorConfig::default()).unwrap();

    let report = generator
        .run(&project.path().join("src"), &mut FileSink::new(&out_dir))
        .expect("Generation should succeed");

    assert_eq!(report.files_scanned, 6);
    assert_eq!(
        report.generated,
        vec!["PostsApiImpl", "AuthApiImpl", "UploadApiImpl"]
    );
    assert_eq!(report.written.len(), 3);
    assert!(report.unchanged.is_empty());

    // GET with a path placeholder
    let posts = read(&out_dir, "api/posts_api_impl.rs");
    assert!(posts.starts_with("// @generated by client-from-source from "));
    assert!(posts.contains("api.rs. Do not edit.\n\n"));
    assert_contains(&posts, "pub struct PostsApiImpl {");
    assert_contains(&posts, "impl PostsApi for PostsApiImpl {");
    assert_contains(
        &posts,
        "let (client, url) = self.context.endpoint(&format!(\"/posts/{}\", id))?;
         let request = client.request(::client_from_source::runtime::reqwest::Method::GET, url);
         let response = ::client_from_source::runtime::send(request).await?;
         Ok(::client_from_source::runtime::read_json(response).await?)",
    );
    assert_contains(
        &posts,
        "if let Some(value) = &page {
             request = request.query(&[(\"page\", value.to_string())]);
         }
         for value in tags.iter() {
             request = request.query(&[(\"tag\", value.to_string())]);
         }",
    );
    assert_contains(
        &posts,
        "request = request.header(\"X-Token\", token.to_string());
         ::client_from_source::runtime::send(request).await?;
         Ok(())",
    );
    assert_contains(&posts, "Method::DELETE");
    // Inherited methods keep resolving from the service trait's module
    assert_contains(
        &posts,
        "impl crate::common::BaseApi for PostsApiImpl {
             async fn health(&self) -> Result<crate::Health, crate::ApiError> {",
    );
    assert_contains(&posts, "impl crate::common::Marker for PostsApiImpl {}");
    assert_contains(&posts, "pub fn create_posts_api(");
    assert!(!posts.contains("ignored"), "Unmarked traits must not be generated");

    // Form body with a field map, attributes reached through an alias
    let auth = read(&out_dir, "auth/auth_api_impl.rs");
    assert_contains(
        &auth,
        "let mut fields = ::client_from_source::runtime::FormFields::new();
         fields.insert(\"username\", &username);
         fields.insert(\"password\", &password);
         fields.extend(extra.iter());
         request = request.form(&fields);",
    );
    assert_contains(&auth, "request = request.header(\"Accept\", \"text/plain\");");
    assert_contains(&auth, "read_text(response).await?");

    // Multipart parts in a nested module of a crate-visible trait
    let upload = read(&out_dir, "net/upload/upload_api_impl.rs");
    assert_contains(&upload, "pub(crate) struct UploadApiImpl {");
    assert_contains(
        &upload,
        "for part in file {
             form = form.part(\"file\", part);
         }",
    );
    assert_contains(
        &upload,
        "if let Some(value) = &name {
             form = form.text(\"name\", value.to_string());
         }",
    );
    assert_contains(&upload, "request = request.multipart(form);");
    assert_contains(&upload, "pub(crate) fn create_upload_api(");
}

#[test]
fn test_second_run_leaves_files_unchanged() {
    let project = blog_project();
    let out_dir = project.path().join("generated");
    let generator = Generator::new(GeneratorConfig::default()).unwrap();
    let source_dir = project.path().join("src");

    generator.run(&source_dir, &mut FileSink::new(&out_dir)).unwrap();
    let first = read(&out_dir, "api/posts_api_impl.rs");

    let report = generator.run(&source_dir, &mut FileSink::new(&out_dir)).unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.unchanged.len(), 3);
    assert_eq!(read(&out_dir, "api/posts_api_impl.rs"), first);
}

#[test]
fn test_output_directory_inside_source_tree_is_not_scanned() {
    let project = blog_project();
    let source_dir = project.path().join("src");
    let out_dir = source_dir.join("generated");
    let generator = Generator::new(GeneratorConfig {
        exclude: vec![out_dir.clone()],
        ..GeneratorConfig::default()
    })
    .unwrap();

    generator.run(&source_dir, &mut FileSink::new(&out_dir)).unwrap();
    let report = generator.run(&source_dir, &mut FileSink::new(&out_dir)).unwrap();

    assert_eq!(report.files_scanned, 6);
    assert_eq!(report.generated.len(), 3);
}

#[test]
fn test_get_with_body_fails_before_any_output() {
    let project = create_test_project(vec![
        ("lib.rs", include_str!("fixtures/blog/lib.rs")),
        ("api.rs", include_str!("fixtures/blog/api.rs")),
        ("search.rs", include_str!("fixtures/broken_api.rs")),
    ]);
    let out_dir = project.path().join("generated");
    let generator = Generator::new(GeneratorConfig::default()).unwrap();

    let err = generator
        .run(&project.path().join("src"), &mut FileSink::new(&out_dir))
        .unwrap_err();

    match err {
        GeneratorError::Validation(e) => {
            assert_eq!(e.interface, "SearchApi");
            assert_eq!(e.method, "search");
            assert_eq!(e.rule, ValidationRule::BodyVerb);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!out_dir.exists(), "Nothing may be written when validation fails");
}

#[test]
fn test_keep_going_generates_valid_traits() {
    let project = create_test_project(vec![
        ("api.rs", include_str!("fixtures/blog/api.rs")),
        ("search.rs", include_str!("fixtures/broken_api.rs")),
    ]);
    let generator = Generator::new(GeneratorConfig {
        fail_fast: false,
        ..GeneratorConfig::default()
    })
    .unwrap();
    let mut sink = MemorySink::new();

    let err = generator.run(&project.path().join("src"), &mut sink).unwrap_err();

    assert!(err.to_string().contains("SearchApi::search"));
    assert!(sink.get("PostsApiImpl").is_some());
    assert!(sink.get("SearchApiImpl").is_none());
}

#[test]
fn test_syntax_errors_are_reported() {
    let project = create_test_project(vec![
        ("api.rs", include_str!("fixtures/blog/api.rs")),
        ("broken.rs", "pub trait Broken {"),
    ]);
    let generator = Generator::new(GeneratorConfig::default()).unwrap();

    let err = generator
        .run(&project.path().join("src"), &mut MemorySink::new())
        .unwrap_err();

    assert!(matches!(err, GeneratorError::Parse { .. }));
}

#[test]
fn test_model_dump_lists_bindings_and_encodings() {
    let project = blog_project();
    let generator = Generator::new(GeneratorConfig::default()).unwrap();

    let analysis = generator.analyze(&project.path().join("src")).unwrap();
    let json = serialize_json(&analysis.plans).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.as_array().unwrap().len(), 3);
    let auth = &parsed[1];
    assert_eq!(auth["interface"]["name"], "AuthApi");
    assert_eq!(auth["interface"]["module_path"][0], "auth");
    assert_eq!(auth["encodings"][0]["kind"], "form_url_encoded");
    assert_eq!(auth["encodings"][1]["kind"], "no_body");
    assert_eq!(parsed[2]["encodings"][0]["kind"], "multipart");
}

#[test]
fn test_output_matches_checked_in_implementations() {
    let project = blog_project();
    let out_dir = project.path().join("generated");
    let generator = Generator::new(GeneratorConfig::default()).unwrap();

    generator
        .run(&project.path().join("src"), &mut FileSink::new(&out_dir))
        .unwrap();

    // These files are compiled by generated_client_test.rs
    let expected = [
        ("api/posts_api_impl.rs", include_str!("fixtures/generated/api/posts_api_impl.rs")),
        ("auth/auth_api_impl.rs", include_str!("fixtures/generated/auth/auth_api_impl.rs")),
        (
            "net/upload/upload_api_impl.rs",
            include_str!("fixtures/generated/net/upload/upload_api_impl.rs"),
        ),
    ];
    for (relative, checked_in) in expected {
        let generated = read(&out_dir, relative);
        assert_eq!(
            squash(body(&generated)),
            squash(body(checked_in)),
            "{} differs from the checked-in copy:\n{}",
            relative,
            generated
        );
    }
}
