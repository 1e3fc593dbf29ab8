//! Record store integration tests: source parsing + key-value storage + mutations.
//!
//! Run with: `cargo test`

use tempfile::TempDir;
use uuid::Uuid;

use sitebook::config::Config;
use sitebook::error::SiteError;
use sitebook::record::{RecordDraft, RecordPatch};
use sitebook::source;
use sitebook::storage::kv::{FileKv, KvStore, MemoryKv};
use sitebook::store::{search, RecordStore};

const HEADER: &str = "website_name,category,country,launch_year,monthly_visitors,user_name,login_time,comment,feedback,rating";

const LEGACY: &str = r#"[{"website_name":"Old","category":"c","country":"US","launch_year":"1990",
    "monthly_visitors":"1","user_name":"u","login_time":"t","comment":"c","feedback":"f","rating":"2"}]"#;

fn tmp_dir() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn memory_store() -> RecordStore {
    RecordStore::new(Box::new(MemoryKv::new()), "websites")
}

fn sample_csv() -> String {
    format!(
        "{HEADER}\n\
         Alpha News,News,US,2001,1000,alice,1/2/2024 10:00,ok,good,4\n\
         beta shop,Retail,DE,2010,250,bob,1/3/2024 11:00,fine,meh,3\n\
         ABC Daily,News,UK,1999,9000,carol,1/4/2024 12:00,great,love it,5\n"
    )
}

fn seeded_store() -> RecordStore {
    let mut store = memory_store();
    store.seed(&sample_csv(), false).expect("seed");
    store
}

fn valid_draft() -> RecordDraft {
    RecordDraft {
        website_name: "Gamma Blog".into(),
        category: "Blog".into(),
        country: "FR".into(),
        launch_year: "2020".into(),
        monthly_visitors: "500".into(),
        user_name: "dave".into(),
        comment: "new".into(),
        feedback: "nice".into(),
        rating: "3".into(),
    }
}

// ─────────────────────────────── parsing ─────────────────────────────────────

#[test]
fn test_parse_drops_row_with_empty_fields() {
    let records = source::parse("h1,h2\nA,B,C,2000,100,u,t,c,f,5\n,,,,,,,,,");
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.website_name, "A");
    assert_eq!(r.category, "B");
    assert_eq!(r.launch_year, "2000");
    assert_eq!(r.rating, "5");
}

#[test]
fn test_parse_all_fields_non_empty() {
    let text = format!(
        "{HEADER}\n\
         a,b,c,1,2,u,t,c,f,1\n\
         a,,c,1,2,u,t,c,f,1\n\
         a,b,c,1,2,u,t,c,f\n\
         a,b,c,1,2,u,t,c,f,1,extra\n\
         \n\
         a,b,c,1,2,u,t,c,f,  \n\
         x,y,z,3,4,v,w,d,g,2\r\n"
    );
    let records = source::parse(&text);
    assert_eq!(records.len(), 2);
    for r in &records {
        assert!(r.columns().iter().all(|c| !c.is_empty()));
    }
    assert_eq!(records[1].website_name, "x");
    assert_eq!(records[1].rating, "2", "trailing CR must not leak into the last field");
}

#[test]
fn test_parse_honors_quoting() {
    let text = format!(
        "{HEADER}\n\"Acme, Inc.\",Retail,US,2004,10,eve,\"3/1/2024, 9:00:00 AM\",\"said \"\"hi\"\"\",ok,4\n"
    );
    let records = source::parse(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].website_name, "Acme, Inc.");
    assert_eq!(records[0].login_time, "3/1/2024, 9:00:00 AM");
    assert_eq!(records[0].comment, "said \"hi\"");
}

#[test]
fn test_parse_keeps_file_order_and_unique_ids() {
    let records = source::parse(&sample_csv());
    let names: Vec<_> = records.iter().map(|r| r.website_name.as_str()).collect();
    assert_eq!(names, ["Alpha News", "beta shop", "ABC Daily"]);
    assert_ne!(records[0].id, records[1].id);
    assert!(records.iter().all(|r| !r.id.is_nil()));
}

#[test]
fn test_parse_header_only_or_empty() {
    assert!(source::parse("").is_empty());
    assert!(source::parse(HEADER).is_empty());
}

// ─────────────────────────────── load / save ─────────────────────────────────

#[test]
fn test_load_missing_is_empty() {
    let store = memory_store();
    assert!(store.load().is_empty());
    assert!(!store.is_seeded().expect("is_seeded"));
}

#[test]
fn test_load_corrupt_is_empty() {
    let kv = MemoryKv::new();
    kv.set("websites", "{not json").expect("set");
    let store = RecordStore::new(Box::new(kv), "websites");
    assert!(store.load().is_empty());
}

#[test]
fn test_save_load_idempotent() {
    let mut store = seeded_store();
    let first = store.load();
    store.save(&first).expect("save");
    assert_eq!(store.load(), first);
}

#[test]
fn test_legacy_records_get_stable_ids() {
    let kv = MemoryKv::new();
    kv.set("websites", LEGACY).expect("set");
    let mut store = RecordStore::new(Box::new(kv), "websites");

    // Reading alone never re-keys.
    assert!(store.load()[0].id.is_nil());

    assert_eq!(store.assign_missing_ids().expect("assign"), 1);
    let first = store.load();
    assert_eq!(first.len(), 1);
    assert!(!first[0].id.is_nil());
    assert_eq!(first[0].website_name, "Old");

    assert_eq!(store.assign_missing_ids().expect("assign"), 0);
    assert_eq!(store.load(), first);
}

#[test]
fn test_open_rekeys_legacy_file() {
    let dir = tmp_dir();
    std::fs::write(dir.path().join("websites.json"), LEGACY).expect("write legacy");
    let cfg = Config::from_toml(&format!(
        "[source]\npath = 'unused.csv'\n[storage]\ndir = '{}'\n",
        dir.path().display()
    ))
    .expect("config");

    let id = {
        let store = RecordStore::open(&cfg.storage).expect("open");
        let records = store.load();
        assert!(!records[0].id.is_nil());
        records[0].id
    };

    let store = RecordStore::open(&cfg.storage).expect("reopen");
    assert_eq!(store.load()[0].id, id);
}

// ─────────────────────────────── seeding ─────────────────────────────────────

#[test]
fn test_seed_only_once_unless_forced() {
    let mut store = memory_store();
    assert_eq!(store.seed(&sample_csv(), false).expect("seed"), Some(3));

    let one_row = format!("{HEADER}\nz,b,c,1,2,u,t,c,f,1\n");
    assert_eq!(store.seed(&one_row, false).expect("seed"), None);
    assert_eq!(store.len(), 3);

    assert_eq!(store.seed(&one_row, true).expect("seed"), Some(1));
    assert_eq!(store.len(), 1);
}

// ─────────────────────────────── search ──────────────────────────────────────

#[test]
fn test_search_empty_term_returns_all_in_order() {
    let store = seeded_store();
    assert_eq!(store.search(""), store.load());
}

#[test]
fn test_search_case_insensitive() {
    let store = seeded_store();
    let upper = store.search("ABC");
    let lower = store.search("abc");
    assert_eq!(upper, lower);
    assert_eq!(upper.len(), 1);
    assert_eq!(upper[0].website_name, "ABC Daily");

    let news = search(&store.load(), "NEWS");
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].website_name, "Alpha News");
}

#[test]
fn test_search_does_not_mutate() {
    let store = seeded_store();
    let before = store.load();
    assert!(store.search("nothing matches this").is_empty());
    assert_eq!(store.load(), before);
}

// ─────────────────────────────── insert ──────────────────────────────────────

#[test]
fn test_insert_valid_appends() {
    let mut store = seeded_store();
    let before = store.len();
    let record = store.insert(valid_draft()).expect("insert");

    let after = store.load();
    assert_eq!(after.len(), before + 1);
    assert_eq!(after.last(), Some(&record));
    assert!(!record.login_time.is_empty());
}

#[test]
fn test_insert_rating_out_of_range_rejected() {
    let mut store = seeded_store();
    let before = store.load();

    for rating in ["6", "0", "abc"] {
        let draft = RecordDraft { rating: rating.into(), ..valid_draft() };
        match store.insert(draft) {
            Err(SiteError::Validation(problems)) => {
                assert!(problems.iter().any(|p| p.contains("rating")), "{problems:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
    assert_eq!(store.load(), before);
}

#[test]
fn test_insert_reports_every_problem() {
    let mut store = memory_store();
    let draft = RecordDraft {
        launch_year: "soon".into(),
        monthly_visitors: "many".into(),
        category: String::new(),
        ..valid_draft()
    };
    let Err(SiteError::Validation(problems)) = store.insert(draft) else {
        panic!("expected validation error");
    };
    assert_eq!(problems.len(), 3, "{problems:?}");
    assert!(store.load().is_empty());
}

#[test]
fn test_insert_rating_bounds_inclusive() {
    let mut store = memory_store();
    store.insert(RecordDraft { rating: "1".into(), ..valid_draft() }).expect("rating 1");
    store.insert(RecordDraft { rating: "5".into(), ..valid_draft() }).expect("rating 5");
    assert_eq!(store.len(), 2);
}

// ─────────────────────────────── update / delete ─────────────────────────────

#[test]
fn test_update_single_field() {
    let mut store = seeded_store();
    let before = store.load();
    let target = before[1].clone();

    let patch = RecordPatch { category: Some("X".into()), ..Default::default() };
    let updated = store.update(target.id, patch).expect("update").expect("found");

    let after = store.load();
    assert_eq!(after.len(), before.len());
    let r = &after[1];
    assert_eq!(r, &updated);
    assert_eq!(r.id, target.id);
    assert_eq!(r.category, "X");
    assert_eq!(r.website_name, target.website_name);
    assert_eq!(r.country, target.country);
    assert_eq!(r.launch_year, target.launch_year);
    assert_eq!(r.monthly_visitors, target.monthly_visitors);
    assert_eq!(r.user_name, target.user_name);
    assert_eq!(r.comment, target.comment);
    assert_eq!(r.feedback, target.feedback);
    assert_eq!(r.rating, target.rating);
    assert_ne!(r.login_time, target.login_time);
    // Neighbours untouched.
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
}

#[test]
fn test_update_empty_value_keeps_prior() {
    let mut store = seeded_store();
    let target = store.load()[0].clone();
    let patch = RecordPatch {
        website_name: Some("   ".into()),
        rating: Some("2".into()),
        ..Default::default()
    };
    let updated = store.update(target.id, patch).expect("update").expect("found");
    assert_eq!(updated.website_name, target.website_name);
    assert_eq!(updated.rating, "2");
}

#[test]
fn test_update_unknown_id_is_noop() {
    let mut store = seeded_store();
    let before = store.load();
    let patch = RecordPatch { category: Some("X".into()), ..Default::default() };
    assert!(store.update(Uuid::new_v4(), patch).expect("update").is_none());
    assert_eq!(store.load(), before);
}

#[test]
fn test_delete_shifts_following_records() {
    let mut store = seeded_store();
    let before = store.load();

    assert!(store.delete(before[0].id).expect("delete"));

    let after = store.load();
    assert_eq!(after.len(), before.len() - 1);
    assert_eq!(after[0], before[1]);
    assert_eq!(after[1], before[2]);
    assert!(store.get(before[0].id).is_none());
}

#[test]
fn test_delete_middle_record() {
    let mut store = seeded_store();
    let before = store.load();

    assert!(store.delete(before[1].id).expect("delete"));

    assert_eq!(store.load(), vec![before[0].clone(), before[2].clone()]);
}

#[test]
fn test_delete_last_record() {
    let mut store = seeded_store();
    let before = store.load();

    assert!(store.delete(before[2].id).expect("delete"));

    assert_eq!(store.load(), before[..2].to_vec());

    // Emptying the collection leaves an empty, still-seeded store.
    assert!(store.delete(before[0].id).expect("delete"));
    assert!(store.delete(before[1].id).expect("delete"));
    assert!(store.is_empty());
    assert!(store.is_seeded().expect("is_seeded"));
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let mut store = seeded_store();
    let before = store.load();
    assert!(!store.delete(Uuid::new_v4()).expect("delete"));
    assert_eq!(store.load(), before);
}

#[test]
fn test_ids_stay_valid_after_other_deletes() {
    let mut store = seeded_store();
    let records = store.load();
    let last = records[2].clone();

    store.delete(records[0].id).expect("delete");
    let patch = RecordPatch { feedback: Some("still me".into()), ..Default::default() };
    let updated = store.update(last.id, patch).expect("update").expect("found");
    assert_eq!(updated.website_name, last.website_name);
    assert_eq!(store.get(last.id).expect("get").feedback, "still me");
}

// ─────────────────────────────── file storage ────────────────────────────────

#[test]
fn test_file_store_survives_reopen() {
    let dir = tmp_dir();
    let cfg = Config::from_toml(&format!(
        "[source]\npath = 'unused.csv'\n[storage]\ndir = '{}'\n",
        dir.path().display()
    ))
    .expect("config");

    let inserted = {
        let mut store = RecordStore::open(&cfg.storage).expect("open");
        store.seed(&sample_csv(), false).expect("seed");
        store.insert(valid_draft()).expect("insert")
    };

    let store = RecordStore::open(&cfg.storage).expect("reopen");
    assert_eq!(store.len(), 4);
    assert_eq!(store.get(inserted.id), Some(inserted));
    assert!(dir.path().join("websites.json").exists());
    assert!(!dir.path().join("websites.json.tmp").exists());
}

#[test]
fn test_file_kv_get_set_remove() {
    let dir = tmp_dir();
    let kv = FileKv::open(&dir.path().join("nested")).expect("open");
    assert_eq!(kv.get("k").expect("get"), None);
    kv.set("k", "one").expect("set");
    kv.set("k", "two").expect("set");
    assert_eq!(kv.get("k").expect("get").as_deref(), Some("two"));
    kv.remove("k").expect("remove");
    kv.remove("k").expect("remove twice");
    assert_eq!(kv.get("k").expect("get"), None);
}

#[test]
fn test_store_keys_are_isolated() {
    let dir = tmp_dir();
    let mut a = RecordStore::new(Box::new(FileKv::open(dir.path()).expect("open")), "a");
    let b = RecordStore::new(Box::new(FileKv::open(dir.path()).expect("open")), "b");
    a.seed(&sample_csv(), false).expect("seed");
    assert_eq!(a.len(), 3);
    assert!(b.is_empty());
}

// ─────────────────────────────── config ──────────────────────────────────────

#[test]
fn test_config_defaults_and_validation() {
    let cfg = Config::from_toml("[source]\npath = 'w.csv'\n[storage]\ndir = 'data'\n")
        .expect("config");
    assert_eq!(cfg.storage.key, "websites");
    assert!(cfg.api.enabled);
    assert_eq!(cfg.api.port, 8080);
    assert!(cfg.api.static_dir.is_none());

    let bad_key = Config::from_toml(
        "[source]\npath = 'w.csv'\n[storage]\ndir = 'data'\nkey = '../escape'\n",
    );
    assert!(matches!(bad_key, Err(SiteError::Config(_))));

    let missing_source = Config::from_toml("[storage]\ndir = 'data'\n");
    assert!(matches!(missing_source, Err(SiteError::Config(_))));
}
