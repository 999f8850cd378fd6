mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use common::{TestWorkspace, path_arg};

const ORDERS: &str = "id,price,code\n1,10.50,007\n2,20.00,042\n";

const ORDERS_SCHEMA: &str = "\
name,type,size,pkey,unit,format,title,example
id,integer,,,,,,1
price,decimal,\"4,2\",,,,,10.50
code,char,3,,,,,007
";

fn mkmeta() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("csv-mkmeta");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn writes_canonical_schema_and_table_meta() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .success()
        .stderr(predicate::str::contains("Created file:"))
        .stderr(predicate::str::contains("Analysed 2 row(s) across 3 column(s)"));

    assert_eq!(workspace.read("orders.schema.csv"), ORDERS_SCHEMA);
    let meta = workspace.read("orders.meta.csv");
    let lines = meta.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0], "name,value");
    assert_eq!(lines[1], "charset,UTF-8");
    assert_eq!(lines[2], "name,orders");
    assert_eq!(lines[3], "title,");
    assert_eq!(lines[15], "notes,");
}

#[test]
fn row_cap_analyses_only_the_first_rows() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("mixed.csv", "value,label\n1,a\nx,bb\n");

    mkmeta()
        .args(["-N", "1", path_arg(&table)])
        .assert()
        .success()
        .stderr(predicate::str::contains("Analysed 1 row(s)"));

    let schema = workspace.read("mixed.schema.csv");
    assert!(schema.contains("value,integer,,,,,,1\n"), "{schema}");
    assert!(schema.contains("label,char,1,,,,,a\n"), "{schema}");
}

#[test]
fn max_rows_accepts_all() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("mixed.csv", "value\n1\nxy\n");

    mkmeta()
        .args(["--max-rows-in", "ALL", path_arg(&table)])
        .assert()
        .success();

    assert!(workspace.read("mixed.schema.csv").contains("value,varchar,2,"));
}

#[test]
fn existing_outputs_are_skipped_independently() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);
    workspace.write("orders.schema.csv", "curated\n");

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .success()
        .stderr(predicate::str::contains("File already exists"))
        .stderr(predicate::str::contains("will not overwrite."))
        .stderr(predicate::str::contains("orders.meta.csv"));

    assert_eq!(workspace.read("orders.schema.csv"), "curated\n");
    assert!(workspace.read("orders.meta.csv").starts_with("name,value\n"));
}

#[test]
fn overwrite_flag_replaces_existing_outputs() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);
    workspace.write("orders.schema.csv", "curated\n");

    mkmeta()
        .args(["-f", path_arg(&table)])
        .assert()
        .success()
        .stderr(predicate::str::contains("Overwriting existing file"));

    assert_eq!(workspace.read("orders.schema.csv"), ORDERS_SCHEMA);
}

#[test]
fn quiet_suppresses_informational_diagnostics() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);
    workspace.write("orders.meta.csv", "kept\n");

    mkmeta()
        .args(["-q", path_arg(&table)])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    assert!(workspace.exists("orders.schema.csv"));
}

#[test]
fn transposed_format_writes_one_row_per_metafield() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);

    mkmeta()
        .args(["--format", "transposed", path_arg(&table)])
        .assert()
        .success();

    let schema = workspace.read("orders.schema.csv");
    let lines = schema.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        [
            ",id,price,code",
            "type,integer,decimal,char",
            "size,,\"4,2\",3",
            "pkey,,,",
            "unit,,,",
            "format,,,",
            "title,,,",
            "example,1,10.50,007",
        ]
    );
}

#[test]
fn archive_format_drops_meta_header_and_schema() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);

    mkmeta()
        .args(["--format", "archive", path_arg(&table)])
        .assert()
        .success()
        .stderr(predicate::str::contains("Archive format"));

    assert!(workspace.read("orders.meta.csv").starts_with("charset,UTF-8\n"));
    assert!(!workspace.exists("orders.schema.csv"));
}

#[test]
fn unknown_format_falls_back_to_canonical() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);

    mkmeta()
        .args(["--format", "sideways", path_arg(&table)])
        .assert()
        .success();

    assert_eq!(workspace.read("orders.schema.csv"), ORDERS_SCHEMA);
}

#[test]
fn missing_input_prints_help_and_fails() {
    mkmeta()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"))
        .stderr(predicate::str::contains("error: missing input file"));
}

#[test]
fn question_mark_prints_help() {
    mkmeta()
        .arg("-?")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-rows-in"));
}

#[test]
fn unreadable_input_fails_without_outputs() {
    let workspace = TestWorkspace::new();

    mkmeta()
        .arg(path_arg(&workspace.file("absent.csv")))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Opening input file"));

    assert!(!workspace.exists("absent.meta.csv"));
}

#[test]
fn empty_input_writes_only_table_meta() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("empty.csv", "");

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .success()
        .stderr(predicate::str::contains("No header row"));

    assert!(workspace.exists("empty.meta.csv"));
    assert!(!workspace.exists("empty.schema.csv"));
}

#[test]
fn output_option_renames_the_sidecars() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("orders.csv", ORDERS);
    let target = workspace.file("sales.csv");

    mkmeta()
        .args(["-o", path_arg(&target), path_arg(&table)])
        .assert()
        .success();

    assert!(workspace.exists("sales.schema.csv"));
    assert!(workspace.read("sales.meta.csv").contains("name,sales\n"));
    assert!(!workspace.exists("orders.schema.csv"));
}

#[test]
fn reads_table_from_stdin() {
    let workspace = TestWorkspace::new();
    let target = workspace.file("piped.csv");

    mkmeta()
        .args(["-o", path_arg(&target), "-"])
        .write_stdin(ORDERS)
        .assert()
        .success();

    assert_eq!(workspace.read("piped.schema.csv"), ORDERS_SCHEMA);
}

#[test]
fn byte_order_mark_is_stripped_from_input_and_not_written() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("bom.csv", b"\xEF\xBB\xBFid\n7\n");

    mkmeta().arg(path_arg(&table)).assert().success();

    let bytes = std::fs::read(workspace.file("bom.schema.csv")).expect("read schema");
    assert!(bytes.starts_with(b"name,type"));
    assert!(workspace.read("bom.schema.csv").contains("\nid,integer,"));
}

#[test]
fn honours_input_encoding_and_separator() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes(
        "legacy.csv",
        b"city;pop\nK\xF6ln;1084831\nM\xFCnchen;1512491\n",
    );

    mkmeta()
        .args(["-E", "windows-1252", "-S", "semicolon", path_arg(&table)])
        .assert()
        .success();

    let schema = std::fs::read(workspace.file("legacy.schema.csv")).expect("read schema");
    let expected_row: &[u8] = b"city,varchar,7,,,,,K\xF6ln";
    assert!(
        schema.windows(expected_row.len()).any(|w| w == expected_row),
        "{}",
        String::from_utf8_lossy(&schema)
    );
    assert!(
        workspace
            .read("legacy.meta.csv")
            .contains("charset,WINDOWS-1252\n")
    );
}

#[test]
fn output_encoding_can_differ_from_input() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("names.csv", "name\nZoë\n");

    mkmeta()
        .args(["-e", "latin1", path_arg(&table)])
        .assert()
        .success();

    let schema = std::fs::read(workspace.file("names.schema.csv")).expect("read schema");
    assert!(schema.ends_with(b"name,char,3,,,,,Zo\xEB\n"));
}

#[test]
fn strict_decoding_rejects_malformed_input() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("bad.csv", b"name\nab\xFFcd\n");

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode"));

    mkmeta()
        .args(["--charset-in-error-mode", "replace", path_arg(&table)])
        .assert()
        .success();
    assert!(workspace.read("bad.schema.csv").contains("ab\u{FFFD}cd"));
}

#[test]
fn existing_sidecars_leave_malformed_input_unread() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("bad.csv", b"name\nab\xFFcd\n");
    workspace.write("bad.meta.csv", "kept\n");
    workspace.write("bad.schema.csv", "curated\n");

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .success()
        .stderr(predicate::str::contains("bad.meta.csv, will not overwrite."))
        .stderr(predicate::str::contains("bad.schema.csv, will not overwrite."))
        .stderr(predicate::str::contains("Failed to decode").not());

    assert_eq!(workspace.read("bad.meta.csv"), "kept\n");
    assert_eq!(workspace.read("bad.schema.csv"), "curated\n");
}

#[test]
fn table_meta_is_written_before_the_scan_fails() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("bad.csv", b"name\nab\xFFcd\n");

    mkmeta()
        .arg(path_arg(&table))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode"));

    assert!(workspace.read("bad.meta.csv").contains("name,bad\n"));
    assert!(!workspace.exists("bad.schema.csv"));
}

#[test]
fn archive_format_never_scans_the_table() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("bad.csv", b"name\nab\xFFcd\n");

    mkmeta()
        .args(["--format", "archive", path_arg(&table)])
        .assert()
        .success();

    assert!(workspace.read("bad.meta.csv").starts_with("charset,UTF-8\n"));
}

#[test]
fn latin1_label_is_recorded_as_latin1() {
    let workspace = TestWorkspace::new();
    let table = workspace.write_bytes("names.csv", b"name\nZo\xEB\n");

    mkmeta()
        .args(["-E", "latin1", path_arg(&table)])
        .assert()
        .success();

    assert!(workspace.read("names.meta.csv").contains("charset,LATIN1\n"));
}

#[test]
fn cell_width_limit_rejects_wide_cells() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("wide.csv", "a,b\nok,abcdef\n");

    mkmeta()
        .args(["--cell-width-limit", "4", path_arg(&table)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2, column 2"))
        .stderr(predicate::str::contains("limit 4"));
}

#[test]
fn ragged_rows_are_tolerated() {
    let workspace = TestWorkspace::new();
    let table = workspace.write("ragged.csv", "a,b,c\n1\n2,x,y,z\n");

    mkmeta().arg(path_arg(&table)).assert().success();

    let schema = workspace.read("ragged.schema.csv");
    assert!(schema.contains("a,integer,,,,,,1\n"), "{schema}");
    assert!(schema.contains("b,char,1,,,,,\n"), "{schema}");
}
