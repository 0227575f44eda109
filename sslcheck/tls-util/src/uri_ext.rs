use http::Uri;
use rustls::pki_types::ServerName;

/// Utility trait for extracting [`ServerName`]s from [`Uri`]s.
pub trait UriExt {
    fn get_server_name(&self) -> Option<ServerName<'static>>;

    /// Returns the port from this [`Uri`], or 443 for `https` and scheme-less URIs.
    ///
    /// [`None`] for any other scheme without an explicit port.
    fn port_or_default(&self) -> Option<u16>;
}

impl UriExt for Uri {
    /// Attempts to extract a [`ServerName`] from this [`Uri`].
    ///
    /// IPv6 brackets are stripped, so `https://[::1]/` gives an IP address server name.
    fn get_server_name(&self) -> Option<ServerName<'static>> {
        let hostname = self.host()?.trim_matches(|c| c == '[' || c == ']');

        ServerName::try_from(hostname.to_string()).ok()
    }

    fn port_or_default(&self) -> Option<u16> {
        self.port_u16().or_else(|| match self.scheme_str() {
            Some("https") | None => Some(443),
            Some(..) => None,
        })
    }
}
