use dotenv::dotenv;
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use toml::Value;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Writer for the generated `app_metadata.rs` file included by `libs::secret`.
struct MetadataFile {
    file: File,
}

impl MetadataFile {
    fn create() -> io::Result<Self> {
        let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
        let file = File::create(Path::new(&out_dir).join("app_metadata.rs"))?;
        Ok(Self { file })
    }

    fn str_const(&mut self, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.file, "#[allow(unused)]\npub const APP_METADATA_{}: &str = {:?};", key.to_uppercase(), value)
    }

    fn bytes_const(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        let bytes = value.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ");
        writeln!(
            self.file,
            "#[allow(unused)]\npub const APP_METADATA_{}: &[u8; {}] = &[{}];",
            key.to_uppercase(),
            value.len(),
            bytes
        )
    }
}

/// Pads or truncates `seed` to exactly `len` bytes.
fn fit(seed: String, len: usize) -> Vec<u8> {
    let mut bytes = seed.into_bytes();
    bytes.resize(len, b'!');
    bytes
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=ENCRYPTION_KEY");
    println!("cargo:rerun-if-env-changed=ENCRYPTION_IV");

    let _ = dotenv();

    let mut metadata = MetadataFile::create()?;
    let package_name = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "taskgen".to_string());
    metadata.str_const("NAME", &package_name)?;
    metadata.str_const("VERSION", &env::var("CARGO_PKG_VERSION").unwrap_or_default())?;

    let manifest: Value = toml::from_str(&fs::read_to_string("Cargo.toml")?).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if let Some(table) = manifest.get("package").and_then(|p| p.get("metadata")).and_then(|m| m.as_table()) {
        for (key, value) in table {
            if let Some(value) = value.as_str() {
                metadata.str_const(key, value)?;
            }
        }
    }

    let (key, iv) = match (env::var("ENCRYPTION_KEY"), env::var("ENCRYPTION_IV")) {
        (Ok(key), Ok(iv)) => {
            if key.len() != KEY_LEN {
                panic!("ENCRYPTION_KEY must be exactly {} bytes long, got {} bytes", KEY_LEN, key.len());
            }
            if iv.len() != IV_LEN {
                panic!("ENCRYPTION_IV must be exactly {} bytes long, got {} bytes", IV_LEN, iv.len());
            }
            (key.into_bytes(), iv.into_bytes())
        }
        _ => {
            println!("cargo:warning=ENCRYPTION_KEY or ENCRYPTION_IV not set, using package-derived defaults.");
            (
                fit(format!("{}_secret_store_key", package_name), KEY_LEN),
                fit(format!("{}_secret_iv", package_name), IV_LEN),
            )
        }
    };

    metadata.bytes_const("ENCRYPTION_KEY", &key)?;
    metadata.bytes_const("ENCRYPTION_IV", &iv)?;

    Ok(())
}
