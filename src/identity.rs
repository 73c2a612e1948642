//! Topic resolution from the push certificate.
//!
//! The topic is the UID attribute (OID 0.9.2342.19200300.100.1.1, RFC 4519
//! section 2.39) in the first position of the certificate subject. It must
//! match the topic the mail delivery side advertises to devices.

use std::path::Path;

use openssl::nid::Nid;
use openssl::x509::X509;

use crate::error::IdentityError;
use crate::types::push::Topic;

pub fn load_topic(path: &Path) -> Result<Topic, IdentityError> {
    let pem = std::fs::read(path).map_err(|source| IdentityError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    resolve_topic(&pem)
}

pub fn resolve_topic(pem: &[u8]) -> Result<Topic, IdentityError> {
    let certificate = X509::from_pem(pem).map_err(IdentityError::Certificate)?;
    let entry = certificate
        .subject_name()
        .entries()
        .next()
        .ok_or(IdentityError::EmptySubject)?;
    if entry.object().nid() != Nid::USERID {
        return Err(IdentityError::MissingUid);
    }
    let value = entry.data().as_utf8().map_err(IdentityError::Encoding)?;
    Ok(Topic::new(value.to_string()))
}
