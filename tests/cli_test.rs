use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("ledgerd"));
    cmd.arg("tests/fixtures/jobs.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("user_id,amount"))
        // 1.5 + 1.5 - 1.0 (transfer out) - 0.5 (withdraw)
        .stdout(predicate::str::contains(
            "00000000-0000-0000-0000-000000000001,1.5",
        ))
        // 2.0 + 1.0 (transfer in)
        .stdout(predicate::str::contains(
            "00000000-0000-0000-0000-000000000002,3.0",
        ))
        .stderr(predicate::str::contains("processed=5 successful=5 failed=0"));

    Ok(())
}

#[test]
fn test_malformed_csv_handling() {
    let user = "00000000-0000-0000-0000-00000000000a";
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "type, from, to, amount").unwrap();
    writeln!(csv, "deposit, , {user}, 1.0").unwrap();
    writeln!(csv, "invalid, , {user}, 1.0").unwrap();
    writeln!(csv, "deposit, , {user}, 0.0").unwrap();
    writeln!(csv, "deposit, , {user}, 2.0").unwrap();

    let mut cmd = Command::new(cargo_bin!("ledgerd"));
    cmd.arg(csv.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading job"))
        .stdout(predicate::str::contains(&format!("{user},3.0"))); // 1.0 + 2.0
}

#[test]
fn test_insufficient_withdraw_reported_per_job() {
    let user = "00000000-0000-0000-0000-00000000000b";
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "type, from, to, amount").unwrap();
    writeln!(csv, "deposit, , {user}, 5.0").unwrap();
    writeln!(csv, "withdraw, {user}, , 10.0").unwrap();

    let mut cmd = Command::new(cargo_bin!("ledgerd"));
    cmd.arg(csv.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("insufficient balance"))
        .stdout(predicate::str::contains(&format!("{user},5.0")));
}
