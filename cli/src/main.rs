// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Command line front end for the `c2pa` crate: sign a JPEG with a new
//! manifest, or verify one that is already embedded. Signing with
//! validation problems in the output still writes the file — the tool
//! reports them rather than treating them as fatal.

mod keystore;

use std::io::Cursor;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use c2pa::jumbf::GenericBox;
use c2pa::{assertions::Action, Builder, HashAlg, Reader, Store};
use clap::Parser;

/// Sign or verify a C2PA provenance manifest embedded in a JPEG.
#[derive(Parser, Debug)]
#[command(name = "c2patool", author, version, about, long_about = None)]
struct Cli {
    /// JPEG file to sign or verify.
    input: PathBuf,

    /// Sign INPUT and write a new manifest (default mode verifies).
    #[arg(long)]
    sign: bool,

    /// Verify INPUT's embedded manifest. This is the default; the flag
    /// exists for symmetry with --sign and to make scripts explicit.
    #[arg(long, conflicts_with = "sign")]
    verify: bool,

    /// Keystore holding the signer's identity (PKCS12; JKS/JCEKS are
    /// recognized but rejected — see keystore.rs).
    #[arg(long, value_name = "PATH", requires = "sign")]
    keystore: Option<PathBuf>,

    /// Keystore password.
    #[arg(long, value_name = "PASSWORD", requires = "sign")]
    password: Option<String>,

    /// Keystore entry alias (accepted, see keystore::load_signer).
    #[arg(long, value_name = "ALIAS", requires = "sign")]
    alias: Option<String>,

    /// Hash algorithm for the data-hash assertion: sha256 (default),
    /// sha384, or sha512.
    #[arg(long, value_name = "NAME")]
    alg: Option<String>,

    /// JSON document to embed as a stds.schema-org.CreativeWork
    /// assertion.
    #[arg(long, value_name = "FILE")]
    creativework: Option<PathBuf>,

    /// Output JPEG path (sign mode only).
    #[arg(long, value_name = "PATH", requires = "sign")]
    out: Option<PathBuf>,

    /// Side-dump the raw JUMBF store bytes to this path.
    #[arg(long, value_name = "PATH")]
    c2pa: Option<PathBuf>,

    /// Wrap INPUT's existing manifest as a parentOf ingredient of the
    /// new one instead of replacing it outright.
    #[arg(long, requires = "sign")]
    repackage: bool,

    /// Print the extracted manifest's JSON projection to stderr before
    /// reporting validation status.
    #[arg(long)]
    debug: bool,

    /// Print the raw JUMBF box tree (type, size, children) to stderr.
    #[arg(long)]
    boxdebug: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.sign {
        run_sign(&cli)
    } else {
        run_verify(&cli)
    }
}

fn run_verify(cli: &Cli) -> Result<()> {
    let asset = std::fs::read(&cli.input).with_context(|| format!("reading {:?}", cli.input))?;

    if cli.boxdebug {
        dump_boxes(&asset)?;
    }

    let reader = Reader::from_jpeg_bytes(&asset)
        .with_context(|| format!("extracting a manifest from {:?}", cli.input))?;

    if cli.debug {
        eprintln!("{reader}");
    }

    if let Some(c2pa_path) = &cli.c2pa {
        let jumbf_bytes = c2pa::jpeg_io::read_jumbf_from_jpeg(&asset)?;
        std::fs::write(c2pa_path, &jumbf_bytes).with_context(|| format!("writing {c2pa_path:?}"))?;
    }

    println!("{}", reader.json()?);

    for status in reader.validation_status() {
        let marker = if status.is_error { "ERROR" } else { "OK" };
        println!("[{marker}] {}", status.code);
        if let Some(msg) = &status.message {
            println!("    {msg}");
        }
    }

    if !reader.is_valid() {
        eprintln!("validation reported one or more errors (see above)");
    }

    Ok(())
}

fn run_sign(cli: &Cli) -> Result<()> {
    let keystore = cli.keystore.as_deref().context("--keystore is required with --sign")?;
    let password = cli.password.as_deref().context("--password is required with --sign")?;
    let signer = keystore::load_signer(keystore, password, cli.alias.as_deref())?;

    let out = cli.out.as_deref().context("--out is required with --sign")?;
    let asset = std::fs::read(&cli.input).with_context(|| format!("reading {:?}", cli.input))?;

    let instance_id = format!(
        "xmp:iid:{}-{}",
        cli.input.file_stem().and_then(|s| s.to_str()).unwrap_or("asset"),
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos()
    );

    let mut builder = Builder::new(
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
        "image/jpeg",
        instance_id,
    );

    if let Some(alg_name) = &cli.alg {
        let alg = HashAlg::from_str(alg_name).with_context(|| format!("unsupported hash algorithm {alg_name:?}"))?;
        builder = builder.with_hash_alg(alg);
    }

    if cli.repackage {
        let prior_jumbf = c2pa::jpeg_io::read_jumbf_from_jpeg(&asset)
            .context("--repackage requires INPUT to already carry a manifest")?;
        let prior_root = GenericBox::read(&mut Cursor::new(prior_jumbf))?;
        let prior_store = Store::from_jumbf_box(&prior_root)?;
        builder.repackage(&prior_store)?;
    } else {
        builder.add_action(Action::new("c2pa.created"))?;
    }

    if let Some(cw_path) = &cli.creativework {
        let text = std::fs::read_to_string(cw_path).with_context(|| format!("reading {cw_path:?}"))?;
        let document: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("parsing {cw_path:?} as JSON"))?;
        builder.add_creative_work(document)?;
    }

    let signed = builder.sign_into_jpeg(&asset, &signer).context("signing manifest into asset")?;
    std::fs::write(out, &signed).with_context(|| format!("writing {out:?}"))?;

    if let Some(c2pa_path) = &cli.c2pa {
        let jumbf_bytes = c2pa::jpeg_io::read_jumbf_from_jpeg(&signed)?;
        std::fs::write(c2pa_path, &jumbf_bytes).with_context(|| format!("writing {c2pa_path:?}"))?;
    }

    // Re-extract and verify what was just written so the caller sees
    // exactly what a later `c2patool --verify` would see. Per the
    // interface's error model this never aborts the command: the file
    // is already on disk, and validation problems are reported, not
    // treated as a failed run.
    match Reader::from_jpeg_bytes(&signed) {
        Ok(reader) => {
            if cli.debug {
                eprintln!("{reader}");
            }
            for status in reader.validation_status() {
                let marker = if status.is_error { "ERROR" } else { "OK" };
                println!("[{marker}] {}", status.code);
            }
            if !reader.is_valid() {
                eprintln!("wrote {out:?} but its manifest reports validation errors (see above)");
            }
        }
        Err(e) => eprintln!("wrote {out:?} but re-reading its manifest failed: {e}"),
    }

    Ok(())
}

/// Print the raw JUMBF box tree's shape (type, size, child count),
/// depth-first. Diagnostic only — not the same projection as
/// `Reader::json`, which interprets the tree as a C2PA store.
fn dump_boxes(asset: &[u8]) -> Result<()> {
    let jumbf_bytes = c2pa::jpeg_io::read_jumbf_from_jpeg(asset).context("no JUMBF payload to dump")?;
    let root = GenericBox::read(&mut Cursor::new(jumbf_bytes))?;
    print_box(&root, 0);
    Ok(())
}

fn print_box(b: &GenericBox, depth: usize) {
    let indent = "  ".repeat(depth);
    let type_str = String::from_utf8_lossy(&b.box_type);
    let label = c2pa::jumbf::label_of(b);
    match label {
        Some(l) => eprintln!("{indent}{type_str} [{l}] ({} children)", b.children().len()),
        None => eprintln!("{indent}{type_str} ({} children)", b.children().len()),
    }
    for child in b.children() {
        print_box(child, depth + 1);
    }
    if b.children().is_empty() {
        if let Some(raw) = b.raw() {
            eprintln!("{indent}  {} bytes", raw.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_surface_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sign_and_verify_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["c2patool", "--sign", "--verify", "asset.jpg"]);
        assert!(result.is_err());
    }

    #[test]
    fn keystore_requires_sign_mode() {
        let result = Cli::try_parse_from(["c2patool", "--keystore", "id.p12", "asset.jpg"]);
        assert!(result.is_err());
    }
}
