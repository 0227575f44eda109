use sslcheck_tls_util::{assemble, load_keystore, IdentityStore, TlsContext, TrustContainer};
use tracing::Level;

use crate::{
    config::TlsArgs,
    error::{CliError, CliResult},
};

/// Trust and identity material resolved from [`TlsArgs`], and the context assembled from it.
#[derive(Debug)]
pub(crate) struct TlsMaterial {
    pub trust: Option<TrustContainer>,
    pub identity: Option<IdentityStore>,
    pub context: TlsContext,
}

#[tracing::instrument(level = Level::DEBUG, skip(args), err(level = Level::DEBUG))]
pub(crate) fn resolve(args: &TlsArgs) -> CliResult<TlsMaterial> {
    let trust = args
        .ca_certs
        .as_deref()
        .map(|path| {
            TrustContainer::from_pem_file(path)
                .map_err(|error| CliError::CaCertificates(path.to_path_buf(), error))
        })
        .transpose()?;

    if let Some(trust) = &trust {
        tracing::info!(count = trust.len(), "Imported CA certificates.");
    }

    let password = args.keystore_password.as_deref();
    let identity = args
        .keystore
        .as_deref()
        .map(|path| {
            load_keystore(
                path,
                password.unwrap_or_default(),
                args.keystore_type.as_deref(),
            )
        })
        .transpose()?;

    let context = assemble(trust.as_ref(), identity.as_ref(), password)?;
    tracing::debug!(?context, "Assembled TLS context.");

    Ok(TlsMaterial {
        trust,
        identity,
        context,
    })
}
