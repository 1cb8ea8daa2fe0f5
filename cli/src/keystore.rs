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

//! Loads a signer identity from a keystore file. The magic bytes pick
//! the format (`0xfeedfeed` JKS, `0xcececece` JCEKS, else PKCS12); only
//! PKCS12 is backed by a real parser here, since the X.509/keystore
//! parsing libraries that would make JKS/JCEKS possible are out of
//! scope collaborators for this tool.

use std::path::Path;

use anyhow::{bail, Context, Result};
use c2pa::{Error as C2paError, Signer, SigningAlg};
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Padding;
use openssl::sign::Signer as OsslSigner;

const JKS_MAGIC: u32 = 0xfeed_feed;
const JCEKS_MAGIC: u32 = 0xcece_cece;

pub struct OpenSslSigner {
    pkey: PKey<Private>,
    alg: SigningAlg,
    chain_der: Vec<Vec<u8>>,
}

impl Signer for OpenSslSigner {
    fn sign(&self, data: &[u8]) -> c2pa::Result<Vec<u8>> {
        let to_err = |e: openssl::error::ErrorStack| C2paError::BadParam(e.to_string());

        if self.alg == SigningAlg::Ed25519 {
            let mut signer = OsslSigner::new_without_digest(&self.pkey).map_err(to_err)?;
            return signer.sign_oneshot_to_vec(data).map_err(to_err);
        }

        let digest = match self.alg {
            SigningAlg::Es256 | SigningAlg::Ps256 => MessageDigest::sha256(),
            SigningAlg::Es384 | SigningAlg::Ps384 => MessageDigest::sha384(),
            SigningAlg::Es512 | SigningAlg::Ps512 => MessageDigest::sha512(),
            SigningAlg::Ed25519 => unreachable!(),
        };

        let mut signer = OsslSigner::new(digest, &self.pkey).map_err(to_err)?;
        if matches!(self.alg, SigningAlg::Ps256 | SigningAlg::Ps384 | SigningAlg::Ps512) {
            signer.set_rsa_padding(Padding::PKCS1_PSS).map_err(to_err)?;
        }
        signer.update(data).map_err(to_err)?;
        signer.sign_to_vec().map_err(to_err)
    }

    fn alg(&self) -> SigningAlg {
        self.alg
    }

    fn cert_chain(&self) -> c2pa::Result<Vec<Vec<u8>>> {
        Ok(self.chain_der.clone())
    }

    fn reserve_size(&self) -> usize {
        self.chain_der.iter().map(Vec::len).sum::<usize>() + 4096
    }
}

/// Load a signer from `path`, sniffing the keystore format by its
/// leading magic bytes. `alias` is accepted for parity with the spec's
/// CLI surface but unused: the PKCS12 parser this tool links against
/// reads the single cert/key pair a PKCS12 file carries rather than
/// selecting among several by friendly name.
pub fn load_signer(path: &Path, password: &str, alias: Option<&str>) -> Result<OpenSslSigner> {
    let bytes = std::fs::read(path).with_context(|| format!("reading keystore {path:?}"))?;
    if bytes.len() < 4 {
        bail!("keystore {path:?} is too short to identify");
    }
    let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

    match magic {
        JKS_MAGIC => bail!(
            "{path:?} is a JKS keystore; this build only signs with PKCS12 identities. \
             Re-export it with `keytool -importkeystore -destkeystoretype PKCS12`."
        ),
        JCEKS_MAGIC => bail!(
            "{path:?} is a JCEKS keystore; this build only signs with PKCS12 identities. \
             Re-export it with `keytool -importkeystore -destkeystoretype PKCS12`."
        ),
        _ => {}
    }

    if let Some(alias) = alias {
        log::debug!("ignoring --alias {alias} (PKCS12 loader reads a single identity)");
    }

    let pkcs12 = Pkcs12::from_der(&bytes).context("parsing PKCS12 keystore")?;
    let parsed = pkcs12.parse2(password).context("unlocking PKCS12 keystore (wrong password?)")?;

    let pkey = parsed.pkey.context("PKCS12 keystore has no private key")?;
    let cert = parsed.cert.context("PKCS12 keystore has no signing certificate")?;

    let mut chain_der = vec![cert.to_der().context("encoding signing certificate")?];
    if let Some(ca) = &parsed.ca {
        for extra in ca.iter() {
            chain_der.push(extra.to_der().context("encoding chain certificate")?);
        }
    }

    let alg = detect_alg(&pkey)?;
    Ok(OpenSslSigner { pkey, alg, chain_der })
}

/// Infer the COSE signing algorithm from the key type, mirroring how a
/// host without an explicit `--alg` flag for signing algorithm would
/// pick one: EC curve determines the ES variant, RSA defaults to PS256,
/// Ed25519 keys sign with EdDSA.
fn detect_alg(pkey: &PKey<Private>) -> Result<SigningAlg> {
    use openssl::nid::Nid;
    use openssl::pkey::Id;

    match pkey.id() {
        Id::RSA => Ok(SigningAlg::Ps256),
        Id::ED25519 => Ok(SigningAlg::Ed25519),
        Id::EC => {
            let ec = pkey.ec_key().context("reading EC key")?;
            let curve = ec.group().curve_name().context("EC key has no named curve")?;
            Ok(match curve {
                Nid::X9_62_PRIME256V1 => SigningAlg::Es256,
                Nid::SECP384R1 => SigningAlg::Es384,
                Nid::SECP521R1 => SigningAlg::Es512,
                other => bail!("unsupported EC curve {other:?}"),
            })
        }
        other => bail!("unsupported private key type {other:?}"),
    }
}
