//! Reading cache descriptors from a fake sysfs tree.

use std::fs;
use std::path::Path;

use memprobe::topology::read_cache_descriptors;
use memprobe::TopologyError;
use tempfile::TempDir;

fn write_index(root: &Path, index: usize, files: &[(&str, &str)]) {
    let dir = root.join(format!("index{}", index));
    fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
}

fn full_tree() -> TempDir {
    let root = TempDir::new().unwrap();
    let levels = [
        ("1", "Data", "48K", "12"),
        ("1", "Instruction", "32K", "8"),
        ("2", "Unified", "2048K", "16"),
        ("3", "Unified", "36M", "12"),
    ];
    for (index, (level, kind, size, ways)) in levels.iter().enumerate() {
        write_index(
            root.path(),
            index,
            &[
                ("level", format!("{}\n", level).as_str()),
                ("type", format!("{}\n", kind).as_str()),
                ("size", format!("{}\n", size).as_str()),
                ("ways_of_associativity", format!("{}\n", ways).as_str()),
                ("coherency_line_size", "64\n"),
            ],
        );
    }
    root
}

#[test]
fn test_reads_every_level() {
    let root = full_tree();
    let descriptors = read_cache_descriptors(root.path()).unwrap();
    assert_eq!(descriptors.len(), 4);

    assert_eq!(descriptors[0].size_bytes, 48 * 1024);
    assert_eq!(descriptors[0].cache_type.as_deref(), Some("Data"));
    assert_eq!(descriptors[0].ways, Some(12));
    assert_eq!(descriptors[0].line_size, Some(64));
    assert!(!descriptors[1].holds_data());
    assert_eq!(descriptors[2].size_bytes, 2 * 1024 * 1024);
    assert_eq!(descriptors[3].level, Some(3));
    assert_eq!(descriptors[3].size_bytes, 36 * 1024 * 1024);
}

#[test]
fn test_stops_at_first_missing_size() {
    let root = full_tree();
    fs::remove_file(root.path().join("index2/size")).unwrap();
    let descriptors = read_cache_descriptors(root.path()).unwrap();
    assert_eq!(descriptors.len(), 2);
}

#[test]
fn test_optional_attributes_missing() {
    let root = TempDir::new().unwrap();
    write_index(root.path(), 0, &[("size", "  32K  \n")]);
    let descriptors = read_cache_descriptors(root.path()).unwrap();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].size_bytes, 32 * 1024);
    assert_eq!(descriptors[0].ways, None);
    assert_eq!(descriptors[0].cache_type, None);
    assert!(descriptors[0].holds_data());
}

#[test]
fn test_empty_root_not_available() {
    let root = TempDir::new().unwrap();
    assert!(matches!(
        read_cache_descriptors(root.path()),
        Err(TopologyError::NotAvailable(_))
    ));
}

#[test]
fn test_bad_size_is_parse_error() {
    let root = TempDir::new().unwrap();
    write_index(root.path(), 0, &[("size", "lots\n")]);
    match read_cache_descriptors(root.path()) {
        Err(TopologyError::Parse { value, .. }) => assert_eq!(value, "lots"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_bad_ways_is_parse_error() {
    let root = TempDir::new().unwrap();
    write_index(root.path(), 0, &[("size", "32K\n"), ("ways_of_associativity", "many\n")]);
    assert!(matches!(
        read_cache_descriptors(root.path()),
        Err(TopologyError::Parse { .. })
    ));
}
