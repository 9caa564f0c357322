//! Indexes small on-disk repositories through the public pipeline.

use std::fs;
use std::path::Path;

use uitestgen::Error;
use uitestgen::config::IndexerConfig;
use uitestgen::contexts::{IndexPipeline, LocalRepository, is_indexed, load_existing};
use uitestgen::data::Category;
use uitestgen::index_store;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_repository(root: &Path) {
    write(
        root,
        "tests/test_login.py",
        "import allure\nfrom pages.login_page import LoginPage\n\n\n@allure.title(\"login\")\ndef test_login(page):\n    LoginPage(page).open()\n",
    );
    write(
        root,
        "pages/login_page.py",
        "from gpn_qa_utils.ui.pages import BasePage\n\n\nclass LoginPage(BasePage):\n    def open(self):\n        pass\n",
    );
    write(
        root,
        "conftest.py",
        "import pytest\n\n\n@pytest.fixture\ndef page():\n    return None\n",
    );
}

#[test]
fn test_indexes_test_page_and_fixture_files() {
    let repo = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    sample_repository(repo.path());
    let index_path = store.path().join("index.json");

    let index = IndexPipeline::default()
        .run(&LocalRepository::new(repo.path()), &index_path, false)
        .unwrap();

    assert_eq!(index.total_files, 3);
    assert_eq!(index.test_files_count, 1);
    assert_eq!(index.component_files_count, 1);

    let category = |name: &str| {
        index
            .files
            .iter()
            .find(|f| f.path == Path::new(name))
            .map(|f| f.category)
    };
    assert_eq!(category("tests/test_login.py"), Some(Category::Test));
    assert_eq!(category("pages/login_page.py"), Some(Category::ReusableComponent));
    assert_eq!(category("conftest.py"), Some(Category::Fixture));

    assert!(index.code_patterns.uses_ui_helpers);
    assert!(index.code_patterns.uses_reporting);
    assert_eq!(index.code_patterns.base_component_type.as_deref(), Some("BasePage"));
    assert!(
        index
            .templates
            .component_template
            .as_deref()
            .is_some_and(|t| t.contains("class LoginPage"))
    );

    assert!(is_indexed(&index_path));
}

#[test]
fn test_stored_index_is_reused_until_forced() {
    let repo = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    sample_repository(repo.path());
    let index_path = store.path().join("nested").join("index.json");
    let source = LocalRepository::new(repo.path());
    let pipeline = IndexPipeline::default();

    let first = pipeline.run(&source, &index_path, false).unwrap();
    fs::remove_file(repo.path().join("conftest.py")).unwrap();

    let reused = pipeline.run(&source, &index_path, false).unwrap();
    assert_eq!(reused.total_files, 3);
    assert_eq!(reused.indexed_at, first.indexed_at);

    let rebuilt = pipeline.run(&source, &index_path, true).unwrap();
    assert_eq!(rebuilt.total_files, 2);
    assert_eq!(load_existing(&index_path).unwrap().total_files, 2);
}

#[test]
fn test_dry_run_leaves_no_index_behind() {
    let repo = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    sample_repository(repo.path());
    let index_path = store.path().join("index.json");

    let index = IndexPipeline::new(IndexerConfig::default())
        .with_dry_run(true)
        .run(&LocalRepository::new(repo.path()), &index_path, false)
        .unwrap();

    assert_eq!(index.total_files, 3);
    assert!(!is_indexed(&index_path));
}

#[test]
fn test_missing_repository_is_a_filesystem_error() {
    let store = tempfile::tempdir().unwrap();
    let result = IndexPipeline::default().run(
        &LocalRepository::new(store.path().join("absent")),
        &store.path().join("index.json"),
        false,
    );
    assert!(matches!(result, Err(Error::Filesystem { .. })));
}

#[test]
fn test_saved_index_loads_back_equal() {
    let repo = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    sample_repository(repo.path());
    let index_path = store.path().join("index.json");

    let index = IndexPipeline::default()
        .with_dry_run(true)
        .run(&LocalRepository::new(repo.path()), &index_path, false)
        .unwrap();
    index_store::save(&index, &index_path).unwrap();

    assert_eq!(index_store::try_load(&index_path).unwrap(), Some(index));
}

#[test]
fn test_corrupt_index_is_rebuilt() {
    let repo = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    sample_repository(repo.path());
    let index_path = store.path().join("index.json");
    fs::write(&index_path, "{ not json").unwrap();

    assert!(matches!(
        index_store::try_load(&index_path),
        Err(Error::StorageCorrupt { .. })
    ));

    let index = IndexPipeline::default()
        .run(&LocalRepository::new(repo.path()), &index_path, false)
        .unwrap();
    assert_eq!(index.total_files, 3);
    assert!(index_store::try_load(&index_path).unwrap().is_some());
}
