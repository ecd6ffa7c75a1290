use std::fs;

use docqa_core::config::{expand_path, ChunkingSettings, Config, Settings};
use docqa_core::extract::{document_name, list_documents, read_pages, split_pages};
use docqa_core::{Chunker, PageText};
use figment::Jail;
use tempfile::TempDir;

fn chunker(size: usize, overlap: usize) -> Chunker {
    Chunker::new(&ChunkingSettings { chunk_size: size, overlap, chars_per_token: 1 }).expect("chunker")
}

#[test]
fn chunk_count_follows_window_formula() {
    let c = chunker(50, 10);
    for len in [51usize, 89, 90, 91, 250, 1000] {
        let text: String = (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = c.chunk_document("doc", &[PageText::new(text, 1)], 0);
        let expected = (len - 10).div_ceil(40);
        assert_eq!(chunks.len(), expected, "len={len}");
        assert_eq!(c.window_count(len), expected);
    }
}

#[test]
fn consecutive_chunks_share_overlap() {
    let c = chunker(50, 10);
    let text: String = (0..230).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let chunks = c.chunk_document("doc", &[PageText::new(text, 3)], 0);
    assert_eq!(chunks.len(), 6);
    for pair in chunks.windows(2).take(chunks.len() - 2) {
        let tail: String = pair[0].text.chars().skip(40).collect();
        let head: String = pair[1].text.chars().take(10).collect();
        assert_eq!(tail, head);
    }
    assert!(chunks.iter().all(|ch| ch.page == 3 && ch.document == "doc"));
}

#[test]
fn blank_pages_are_skipped_and_ids_continue() {
    let c = chunker(50, 10);
    let pages = vec![
        PageText::new("first page", 1),
        PageText::new("  \n\t ", 2),
        PageText::new("", 3),
        PageText::new("fourth page", 4),
    ];
    let chunks = c.chunk_document("manual", &pages, 17);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, 17);
    assert_eq!(chunks[0].page, 1);
    assert_eq!(chunks[1].id, 18);
    assert_eq!(chunks[1].page, 4);
    assert_eq!(chunks[1].text, "fourth page");
}

#[test]
fn split_pages_numbers_from_one_and_keeps_blank_pages() {
    let pages = split_pages("alpha\u{0C}\u{0C}gamma\u{0C}");
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], PageText::new("alpha", 1));
    assert_eq!(pages[1], PageText::new("", 2));
    assert_eq!(pages[2], PageText::new("gamma", 3));
}

#[test]
fn read_pages_and_list_documents() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("b.txt"), "page one\u{0C}page two").unwrap();
    fs::write(dir.join("sub/a.txt"), "only page").unwrap();
    fs::write(dir.join("ignored.md"), "nope").unwrap();

    let docs = list_documents(dir);
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|p| p.extension().is_some_and(|e| e == "txt")));

    let pages = read_pages(&dir.join("b.txt")).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].page_number, 2);
    assert_eq!(document_name(&dir.join("b.txt")), "b");

    assert!(read_pages(&dir.join("missing.txt")).is_err());
}

#[test]
fn config_merges_file_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                [chunking]
                chunk_size = 120

                [store]
                dir = "/tmp/docqa-index"
            "#,
        )?;
        jail.create_file("config.test.toml", "[eval]\ntop_k = 5\n")?;
        jail.set_env("APP_CHUNKING__OVERLAP", "30");

        let settings = Config::load_for_env("test").expect("config").settings().expect("settings");
        assert_eq!(settings.chunking.chunk_size, 120);
        assert_eq!(settings.chunking.overlap, 30);
        assert_eq!(settings.chunking.chars_per_token, 4);
        assert_eq!(settings.store.dir, "/tmp/docqa-index");
        assert_eq!(settings.eval.top_k, 5);
        assert_eq!(settings.retrieval.top_k, 3);
        Ok(())
    });
}

#[test]
fn config_rejects_overlap_not_smaller_than_size() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_CHUNKING__OVERLAP", "200");
        assert!(Config::load_for_env("test").is_err());
        Ok(())
    });
}

#[test]
fn default_settings_are_valid() {
    Settings::default().validate().expect("defaults validate");
}

#[test]
fn expand_path_handles_env_and_plain_paths() {
    Jail::expect_with(|jail| {
        jail.set_env("DOCQA_TEST_ROOT", "/srv/docqa");
        assert_eq!(expand_path("${DOCQA_TEST_ROOT}/index"), std::path::PathBuf::from("/srv/docqa/index"));
        assert_eq!(expand_path("plain/path"), std::path::PathBuf::from("plain/path"));
        assert_eq!(expand_path("$DOCQA_UNSET_VAR/x"), std::path::PathBuf::from("$DOCQA_UNSET_VAR/x"));
        Ok(())
    });
}
