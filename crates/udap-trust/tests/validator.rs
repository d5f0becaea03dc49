//! End-to-end trust decisions over freshly minted certificate chains.

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use udap_trust::{
    AnchorCertificateSet, ChainStatus, PolicyError, TrustAnchorValidator, TrustError,
};

struct TestCa {
    cert: rcgen::Certificate,
    key: KeyPair,
}

fn root_ca(name: &str) -> TestCa {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, name);
    let cert = params.self_signed(&key).unwrap();
    TestCa { cert, key }
}

fn intermediate_ca(name: &str, issuer: &TestCa) -> TestCa {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, name);
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    TestCa { cert, key }
}

fn leaf(host: &str, issuer: &TestCa) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![host.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, host);
    params
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap()
        .der()
        .to_vec()
}

fn expired_leaf(host: &str, issuer: &TestCa) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![host.to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(1999, 1, 1);
    params.not_after = rcgen::date_time_ymd(2000, 1, 1);
    params
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap()
        .der()
        .to_vec()
}

fn anchors_of(ca: &TestCa) -> AnchorCertificateSet {
    let mut set = AnchorCertificateSet::new();
    set.add_root_der(ca.cert.der().to_vec()).unwrap();
    set
}

const NO_INTERMEDIATES: &[Vec<u8>] = &[];

#[test]
fn chain_to_configured_anchor_is_trusted() {
    let root = root_ca("Community Root");
    let inter = intermediate_ca("Community Issuing CA", &root);
    let server = leaf("fhir.example.com", &inter);

    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();
    let decision = validator.validate(
        &server,
        &[inter.cert.der().to_vec()],
        &[PolicyError::UntrustedRoot],
    );

    assert!(decision.trusted, "decision: {decision}");
    assert_eq!(decision.chain.len(), 3);
    assert!(decision.chain.last().unwrap().is_anchor);
    assert!(decision.statuses.is_empty());
}

#[test]
fn unrelated_anchor_is_untrusted() {
    let root = root_ca("Community Root");
    let inter = intermediate_ca("Community Issuing CA", &root);
    let server = leaf("fhir.example.com", &inter);
    let unrelated = root_ca("Some Other Root");

    let validator = TrustAnchorValidator::new(&anchors_of(&unrelated)).unwrap();
    let decision = validator.validate(&server, &[inter.cert.der().to_vec()], &[]);

    assert!(!decision.trusted);
    assert!(
        decision
            .statuses
            .iter()
            .any(|s| matches!(s, ChainStatus::NoIssuerFound { .. })),
        "statuses: {:?}",
        decision.statuses
    );
}

#[test]
fn configured_intermediates_complete_a_partial_chain() {
    let root = root_ca("Community Root");
    let inter = intermediate_ca("Community Issuing CA", &root);
    let server = leaf("fhir.example.com", &inter);

    let mut set = anchors_of(&root);
    set.add_intermediate_der(inter.cert.der().to_vec()).unwrap();

    let validator = TrustAnchorValidator::new(&set).unwrap();
    // The peer sent only its leaf; the configured intermediate fills the gap.
    let decision = validator.validate(&server, NO_INTERMEDIATES, &[]);
    assert!(decision.trusted, "decision: {decision}");
}

#[test]
fn hostname_mismatch_is_never_overridden() {
    let root = root_ca("Community Root");
    let inter = intermediate_ca("Community Issuing CA", &root);
    let server = leaf("fhir.example.com", &inter);

    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();
    let decision = validator.validate(
        &server,
        &[inter.cert.der().to_vec()],
        &[PolicyError::HostnameMismatch],
    );

    assert!(!decision.trusted);
    assert_eq!(
        decision.statuses,
        vec![ChainStatus::ReportedPolicyError(
            PolicyError::HostnameMismatch
        )]
    );
}

#[test]
fn empty_anchor_set_fails_fast() {
    let err = TrustAnchorValidator::new(&AnchorCertificateSet::new()).unwrap_err();
    assert!(matches!(err, TrustError::EmptyAnchorSet));
}

#[test]
fn expired_leaf_is_untrusted_even_with_matching_anchor() {
    let root = root_ca("Community Root");
    let server = expired_leaf("fhir.example.com", &root);

    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();
    let decision = validator.validate(&server, NO_INTERMEDIATES, &[]);

    assert!(!decision.trusted);
    assert!(
        decision
            .statuses
            .iter()
            .any(|s| matches!(s, ChainStatus::Expired { depth: 0 })),
        "statuses: {:?}",
        decision.statuses
    );
}

#[test]
fn presented_anchor_itself_is_trusted() {
    let root = root_ca("Community Root");
    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();

    let decision = validator.validate(root.cert.der(), NO_INTERMEDIATES, &[]);
    assert!(decision.trusted);
    assert_eq!(decision.chain.len(), 1);
    assert!(decision.chain[0].is_anchor);
}

#[test]
fn self_signed_stranger_is_untrusted_root() {
    let root = root_ca("Community Root");
    let stranger = root_ca("Self-Signed Stranger");

    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();
    let decision = validator.validate(stranger.cert.der(), NO_INTERMEDIATES, &[]);

    assert!(!decision.trusted);
    assert!(decision.statuses.contains(&ChainStatus::UntrustedRoot));
}

#[test]
fn concurrent_validation_matches_sequential() {
    let root = root_ca("Community Root");
    let inter = intermediate_ca("Community Issuing CA", &root);
    let unrelated = root_ca("Some Other Root");

    let leaves: Vec<Vec<u8>> = (0..8)
        .map(|i| {
            let issuer = if i % 2 == 0 { &inter } else { &unrelated };
            leaf(&format!("host{i}.example.com"), issuer)
        })
        .collect();
    let extras = vec![inter.cert.der().to_vec()];

    let validator = TrustAnchorValidator::new(&anchors_of(&root)).unwrap();
    let sequential: Vec<bool> = leaves
        .iter()
        .map(|l| validator.validate(l, &extras, &[]).trusted)
        .collect();

    let concurrent: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = leaves
            .iter()
            .map(|l| scope.spawn(|| validator.validate(l, &extras, &[]).trusted))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
    assert_eq!(sequential, vec![true, false, true, false, true, false, true, false]);
}
