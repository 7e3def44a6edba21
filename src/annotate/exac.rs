//! Client for the ExAC variant REST service.

use serde::Deserialize;

/// Base URL of the public ExAC variant endpoint.
pub const DEFAULT_BASE_URL: &str = "http://exac.hms.harvard.edu/rest/variant/variant/";

/// Population allele frequency of one alternate allele.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlleleFrequency {
    /// Frequency reported by the service.
    Frequency(f64),
    /// The service has no frequency for the allele.
    Unavailable,
}

impl std::fmt::Display for AlleleFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlleleFrequency::Frequency(af) => write!(f, "{}", af),
            AlleleFrequency::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// The part of the ExAC variant response that we consume.
#[derive(Debug, Clone, Deserialize)]
struct VariantResponse {
    /// Allele frequency, if the service has one for the variant.
    allele_freq: Option<f64>,
}

/// Configuration for constructing the `AlleleFrequencyClient`.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// Base URL of the variant endpoint.
    #[builder(default = "String::from(DEFAULT_BASE_URL)")]
    pub base_url: String,
}

/// Client for fetching per-allele population frequencies.
///
/// Issues one blocking GET per call; repeated lookups of the same tuple are
/// not cached.
#[derive(Debug)]
pub struct AlleleFrequencyClient {
    /// Configuration of the client.
    config: Config,
    /// The blocking HTTP client used for all requests.
    client: reqwest::blocking::Client,
}

impl AlleleFrequencyClient {
    /// Construct with the given configuration.
    pub fn new(config: Config) -> Self {
        // No request timeout; an unresponsive server blocks the run.
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .expect("could not build HTTP client");
        Self { config, client }
    }

    /// Look up the allele frequency of one `(chrom, pos, ref, alt)` tuple.
    pub fn lookup(
        &self,
        chrom: &str,
        pos: usize,
        reference: &str,
        alt: &str,
    ) -> Result<AlleleFrequency, anyhow::Error> {
        self.fetch(&format!("{}-{}-{}-{}", chrom, pos, reference, alt))
    }

    /// Fetch the allele frequency of a site given in the service's
    /// `chrom-pos-ref-alt` notation.
    pub fn fetch(&self, site: &str) -> Result<AlleleFrequency, anyhow::Error> {
        let url = format!("{}{}", &self.config.base_url, site);
        tracing::debug!("GET {}", &url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| anyhow::anyhow!("request to {} failed: {}", &url, e))?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "request to {} failed with status {}",
            &url,
            response.status()
        );

        let body = response
            .text()
            .map_err(|e| anyhow::anyhow!("could not read response from {}: {}", &url, e))?;
        let response: VariantResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("could not parse response from {}: {}", &url, e))?;

        Ok(match response.allele_freq {
            Some(af) => AlleleFrequency::Frequency(af),
            None => AlleleFrequency::Unavailable,
        })
    }
}

/// Minimal in-process HTTP server with canned responses, for tests.
#[cfg(test)]
pub(crate) mod stub_server {
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};

    /// Spawn a server thread serving the given `(path, status, body)` routes and
    /// return its base URL.  Requests for paths without a route are answered
    /// with 404.  The thread runs until the test process exits.
    pub(crate) fn spawn(routes: &[(&str, u16, &str)]) -> String {
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect();

        let listener = TcpListener::bind("127.0.0.1:0").expect("could not bind stub server");
        let base_url = format!(
            "http://{}/",
            listener.local_addr().expect("could not get local addr")
        );

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle(stream, &routes);
            }
        });

        base_url
    }

    fn handle(mut stream: TcpStream, routes: &HashMap<String, (u16, String)>) {
        let mut reader = BufReader::new(stream.try_clone().expect("could not clone stream"));

        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        // Drain the request headers before answering.
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) if line == "\r\n" || line == "\n" => break,
                Ok(_) => continue,
                Err(_) => return,
            }
        }

        let path = request_line.split_whitespace().nth(1).unwrap_or("/");
        let (status, body) = routes
            .get(path)
            .cloned()
            .unwrap_or((404, String::from("{\"error\": \"not found\"}")));
        let reason = match status {
            200 => "OK",
            404 => "Not Found",
            _ => "Error",
        };

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{stub_server, AlleleFrequency, AlleleFrequencyClient, ConfigBuilder};

    fn client_for(routes: &[(&str, u16, &str)]) -> AlleleFrequencyClient {
        let base_url = stub_server::spawn(routes);
        AlleleFrequencyClient::new(
            ConfigBuilder::default()
                .base_url(format!("{}variant/", base_url))
                .build()
                .expect("could not build config"),
        )
    }

    #[test]
    fn lookup_returns_reported_frequency() -> Result<(), anyhow::Error> {
        let client = client_for(&[(
            "/variant/14-21853913-T-C",
            200,
            r#"{"allele_freq": 0.000046048996131884326, "rsid": "rs147599162"}"#,
        )]);

        let af = client.lookup("14", 21853913, "T", "C")?;

        assert_eq!(af, AlleleFrequency::Frequency(0.000046048996131884326));

        Ok(())
    }

    #[test]
    fn lookup_without_frequency_is_unavailable() -> Result<(), anyhow::Error> {
        let client = client_for(&[("/variant/1-100-A-G", 200, r#"{"rsid": null}"#)]);

        let af = client.lookup("1", 100, "A", "G")?;

        assert_eq!(af, AlleleFrequency::Unavailable);

        Ok(())
    }

    #[test]
    fn fetch_malformed_site_fails() {
        let client = client_for(&[(
            "/variant/14-21853913-T-C",
            200,
            r#"{"allele_freq": 0.000046048996131884326}"#,
        )]);

        // Underscores instead of hyphens; the service answers with 404.
        let result = client.fetch("14_21853913_T_C");

        let message = result.unwrap_err().to_string();
        assert!(
            message.contains("failed with status 404"),
            "unexpected error: {}",
            message
        );
    }

    #[test]
    fn fetch_unparseable_body_fails() {
        let client = client_for(&[("/variant/1-100-A-G", 200, "flagrantly not JSON")]);

        let result = client.fetch("1-100-A-G");

        let message = result.unwrap_err().to_string();
        assert!(
            message.contains("could not parse response"),
            "unexpected error: {}",
            message
        );
    }

    #[rstest::rstest]
    #[case(AlleleFrequency::Frequency(0.000046048996131884326), "0.000046048996131884326")]
    #[case(AlleleFrequency::Frequency(0.5), "0.5")]
    #[case(AlleleFrequency::Unavailable, "unavailable")]
    fn allele_frequency_display(#[case] af: AlleleFrequency, #[case] expected: &str) {
        assert_eq!(af.to_string(), expected);
    }
}
