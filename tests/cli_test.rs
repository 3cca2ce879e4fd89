use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command; // Run programs
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

// Text with enough repetition to exercise runs, written fresh for each test
// so there are no newline substitutions to worry about.
fn sample_lump(temp_dir: &tempfile::TempDir) -> Result<(PathBuf,Vec<u8>),Box<dyn std::error::Error>> {
    let mut txt: Vec<u8> = Vec::new();
    for i in 0..200 {
        txt.extend(format!("THING {} AT {},{} ANGLE {}\r\n",i % 17,i * 32,(i * 7) % 64,(i % 8) * 45).as_bytes());
    }
    let path = temp_dir.path().join("things.raw");
    std::fs::write(&path,&txt)?;
    Ok((path,txt))
}

fn compress_file(in_path: &PathBuf,out_path: &PathBuf) -> STDRESULT {
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("compress")
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));
    Ok(())
}

#[test]
fn compress_then_expand() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (in_path,txt) = sample_lump(&temp_dir)?;
    let cmp_path = temp_dir.path().join("things.lmp");
    let out_path = temp_dir.path().join("things.out");
    compress_file(&in_path,&cmp_path)?;
    let compressed = std::fs::read(&cmp_path)?;
    assert_eq!(compressed.len() % 4,0);
    assert!(compressed.len() < txt.len());
    assert_eq!(compressed,lumpcodec::encode(&txt));
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("expand")
        .arg("-s").arg(txt.len().to_string())
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("into {}",txt.len())));
    assert_eq!(std::fs::read(&out_path)?,txt);
    Ok(())
}

#[test]
fn expand_without_size() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (in_path,txt) = sample_lump(&temp_dir)?;
    let cmp_path = temp_dir.path().join("things.lmp");
    let out_path = temp_dir.path().join("things.out");
    compress_file(&in_path,&cmp_path)?;
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("expand")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out_path)?,txt);
    Ok(())
}

#[test]
fn expand_into_small_buffer_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (in_path,txt) = sample_lump(&temp_dir)?;
    let cmp_path = temp_dir.path().join("things.lmp");
    let out_path = temp_dir.path().join("things.out");
    compress_file(&in_path,&cmp_path)?;
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("expand")
        .arg("-s").arg((txt.len() / 2).to_string())
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("capacity"));
    Ok(())
}

#[test]
fn lump_inside_larger_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (_in_path,txt) = sample_lump(&temp_dir)?;
    let image_path = temp_dir.path().join("image.bin");
    let cmp_path = temp_dir.path().join("things.lmp");
    std::fs::write(&image_path,[b"IWAD".to_vec(),txt.clone()].concat())?;
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("compress")
        .arg("--in-offset").arg("4")
        .arg("-i").arg(&image_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&cmp_path)?,lumpcodec::encode(&txt));
    Ok(())
}

#[test]
fn lump_written_into_larger_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let (in_path,txt) = sample_lump(&temp_dir)?;
    let image_path = temp_dir.path().join("image.bin");
    let image: Vec<u8> = vec![0xee;txt.len() + 1000];
    std::fs::write(&image_path,&image)?;
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("compress")
        .arg("--out-offset").arg("100")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&image_path)
        .assert()
        .success();
    let compressed = lumpcodec::encode(&txt);
    let end = 100 + compressed.len();
    let patched = std::fs::read(&image_path)?;
    assert_eq!(patched.len(),image.len());
    assert_eq!(patched[0..100],image[0..100]);
    assert_eq!(patched[100..end],compressed[..]);
    assert_eq!(patched[end..],image[end..]);
    // and back out again, into the middle of another image
    let out_path = temp_dir.path().join("out.bin");
    std::fs::write(&out_path,&image)?;
    let mut cmd = Command::cargo_bin("lumpcodec")?;
    cmd.arg("expand")
        .arg("--in-offset").arg("100")
        .arg("--out-offset").arg("10")
        .arg("-s").arg(txt.len().to_string())
        .arg("-i").arg(&image_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    let expanded = std::fs::read(&out_path)?;
    assert_eq!(expanded.len(),image.len());
    assert_eq!(expanded[10..10 + txt.len()],txt[..]);
    assert_eq!(expanded[10 + txt.len()..],image[10 + txt.len()..]);
    Ok(())
}
