use sslcheck_tls_util::TrustSource;

use crate::{config::InspectArgs, error::CliResult, tls};

/// Prints what the TLS context built from the given arguments trusts and presents.
pub(crate) fn inspect(args: &InspectArgs) -> CliResult<()> {
    let material = tls::resolve(&args.tls)?;

    let trust_source = material.context.trust_source();
    let origin = match trust_source {
        TrustSource::Explicit { .. } => "explicit anchor(s)",
        TrustSource::System { .. } => "system root(s)",
    };
    println!("Trust: {} {origin}", trust_source.anchors());
    println!(
        "Cipher suites: {}",
        material.context.provider().cipher_suites.len()
    );

    for (label, cert) in material.trust.iter().flat_map(|trust| trust.iter()) {
        println!("  [{label}] {}", cert.subject());
        println!("      issuer: {}", cert.issuer());
        println!("      serial: {}", cert.serial());
    }

    match &material.identity {
        Some(identity) => {
            println!(
                "Identity: {} ({})",
                identity.path().display(),
                identity.format()
            );

            for entry in identity.entries() {
                println!("  [{}]", entry.alias());
                for cert in entry.chain() {
                    println!("      {}", cert.subject());
                }
            }
            for (alias, cert) in identity.trusted_certificates() {
                println!("  [{alias}] trusted certificate {}", cert.subject());
            }
        }
        None => println!("Identity: none"),
    }

    println!(
        "Server side: {}",
        if material.context.server_config().is_some() {
            "available"
        } else {
            "unavailable"
        }
    );

    Ok(())
}
