//! Every hasher against the shared verifier.

#![allow(clippy::unwrap_used)]

use sitekit_core::hashers::{self, HashAlgorithm, HashError};
use sitekit_integration_tests::fast_params;

#[test]
fn test_every_algorithm_verifies_its_own_output() {
    let params = fast_params();

    for algorithm in HashAlgorithm::ALL {
        let encoded = algorithm.encode("correct horse", &params).unwrap();

        assert!(
            encoded.starts_with(&format!("{}$", algorithm.prefix())),
            "{algorithm}: {encoded}"
        );
        assert_eq!(HashAlgorithm::identify(&encoded), Some(algorithm));
        assert!(hashers::verify("correct horse", &encoded).unwrap(), "{algorithm}");
        assert!(!hashers::verify("wrong horse", &encoded).unwrap(), "{algorithm}");
    }
}

#[test]
fn test_names_parse_back() {
    for algorithm in HashAlgorithm::ALL {
        assert_eq!(algorithm.to_string().parse::<HashAlgorithm>().unwrap(), algorithm);
    }
}

#[test]
fn test_same_password_hashes_differently() {
    let params = fast_params();
    let a = HashAlgorithm::Pbkdf2Sha256.encode("secret", &params).unwrap();
    let b = HashAlgorithm::Pbkdf2Sha256.encode("secret", &params).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_unknown_algorithm_rejected() {
    let err = "sha512".parse::<HashAlgorithm>().unwrap_err();

    assert_eq!(err, HashError::InvalidHashType("sha512".to_owned()));
    assert_eq!(
        err.to_string(),
        "Invalid hash type 'sha512'. Choose from: argon2, pbkdf2, pbkdf2_sha1, bcrypt"
    );
}

#[test]
fn test_empty_password_rejected_by_every_algorithm() {
    let params = fast_params();
    for algorithm in HashAlgorithm::ALL {
        assert_eq!(
            algorithm.encode("", &params).unwrap_err(),
            HashError::EmptyPassword,
            "{algorithm}"
        );
    }
}

#[test]
fn test_default_is_argon2() {
    assert_eq!(HashAlgorithm::default(), HashAlgorithm::Argon2);
}
