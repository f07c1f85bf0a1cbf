use assert_cmd::cargo; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use rand::RngCore;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn write_key_file(path: &std::path::Path) -> STDRESULT {
    let mut keys = vec![0u8;128];
    rand::thread_rng().fill_bytes(&mut keys);
    std::fs::write(path,&keys)?;
    Ok(())
}

#[test]
fn mkvol_put_get_round_trip() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let key_path = dir.path().join("keys.bin");
    let img_path = dir.path().join("vol.tsv");
    write_key_file(&key_path)?;

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("mkvol")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-s").arg("512")
        .arg("-n").arg("16")
        .assert()
        .success();

    let payload = b"HELLO FROM THE SECURE VOLUME";
    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("put")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-o").arg("1000")
        .write_stdin(&payload[..])
        .assert()
        .success();

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("get")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-o").arg("1000")
        .arg("-l").arg(payload.len().to_string())
        .assert()
        .success()
        .stdout(predicate::eq(&payload[..]));
    Ok(())
}

#[test]
fn stat_reports_geometry() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let key_path = dir.path().join("keys.bin");
    let img_path = dir.path().join("vol.tsv");
    write_key_file(&key_path)?;

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("mkvol")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-s").arg("512")
        .arg("-n").arg("16")
        .assert()
        .success();

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("stat")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("--scrub")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sector_count\":16"))
        .stdout(predicate::str::contains("\"volume_size\":8192"))
        .stdout(predicate::str::contains("\"bad_replicas\":0"))
        .stdout(predicate::str::contains("\"readable\":true"));
    Ok(())
}

#[test]
fn wrong_keys_are_rejected() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let key_path = dir.path().join("keys.bin");
    let other_key_path = dir.path().join("other.bin");
    let img_path = dir.path().join("vol.tsv");
    write_key_file(&key_path)?;
    write_key_file(&other_key_path)?;

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("mkvol")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-s").arg("512")
        .arg("-n").arg("4")
        .assert()
        .success();

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("get")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&other_key_path)
        .arg("-o").arg("0")
        .arg("-l").arg("16")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Auth"));
    Ok(())
}

#[test]
fn short_key_file_is_rejected() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let key_path = dir.path().join("keys.bin");
    let img_path = dir.path().join("vol.tsv");
    std::fs::write(&key_path,&[0u8;5])?;

    let mut cmd = cargo::cargo_bin_cmd!("tsvkit");
    cmd.arg("mkvol")
        .arg("-d").arg(&img_path)
        .arg("-k").arg(&key_path)
        .arg("-s").arg("512")
        .arg("-n").arg("4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BadKeyFile"));
    Ok(())
}
