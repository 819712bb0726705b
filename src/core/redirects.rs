//! Follows HTTP redirects one hop at a time so every hop can be shown.

use crate::errors::{Error, Result};
use reqwest::{Client, Url, redirect::Policy};
use std::time::Duration;

/// Maximum number of redirects followed before giving up
pub const MAX_HOPS: usize = 10;

/// One response in a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// HTTP status code
    pub status: u16,
    /// URL that produced this response
    pub url: String,
}

/// Builds a client that never follows redirects on its own.
pub fn client() -> Result<Client> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("KaiBOT/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Into::into)
}

/// Strips the `<...>` Discord uses to suppress embeds and parses the URL.
pub fn parse_link(link: &str) -> Result<Url> {
    let trimmed = link.trim().trim_start_matches('<').trim_end_matches('>');
    let url = Url::parse(trimmed).map_err(|e| Error::Config {
        message: format!("invalid link {trimmed:?}: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config {
            message: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

/// Resolves the `Location` of a redirect against the URL that sent it.
#[must_use]
pub fn next_location(current: &Url, location: &str) -> Option<Url> {
    current.join(location).ok()
}

/// The responses seen while following a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Every response, starting with the requested URL
    pub hops: Vec<Hop>,
    /// Whether the last hop still redirected when [`MAX_HOPS`] ran out
    pub truncated: bool,
}

/// Requests `start` and every redirect after it, up to [`MAX_HOPS`].
pub async fn resolve(client: &Client, start: Url) -> Result<Chain> {
    let mut hops = Vec::new();
    let mut current = start;

    loop {
        let response = client.get(current.clone()).send().await?;
        let status = response.status();
        hops.push(Hop {
            status: status.as_u16(),
            url: current.to_string(),
        });

        if !status.is_redirection() {
            break;
        }
        let next = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| next_location(&current, location));
        let Some(next) = next else {
            break;
        };
        if hops.len() > MAX_HOPS {
            return Ok(Chain {
                hops,
                truncated: true,
            });
        }
        current = next;
    }

    Ok(Chain {
        hops,
        truncated: false,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    #[test]
    fn test_parse_link_strips_brackets() {
        let url = parse_link("<https://example.com/a>").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
        assert!(parse_link("ftp://example.com").is_err());
        assert!(parse_link("not a link").is_err());
    }

    /// Serves `/n` as a 302 to `/n+1` until `redirects` is reached, then 200.
    fn serve_redirects(redirects: usize, connections: usize) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let mut buffer = [0; 1024];
                let read = stream.read(&mut buffer).unwrap();
                let request = String::from_utf8_lossy(&buffer[..read]);
                let step: usize = request
                    .split_whitespace()
                    .nth(1)
                    .and_then(|path| path.trim_start_matches('/').parse().ok())
                    .unwrap_or(0);
                let response = if step < redirects {
                    format!(
                        "HTTP/1.1 302 Found\r\nLocation: /{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        step + 1
                    )
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                };
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        Url::parse(&format!("http://{address}/0")).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_follows_chain_to_the_end() {
        let start = serve_redirects(2, 3);
        let chain = resolve(&client().unwrap(), start).await.unwrap();

        let statuses: Vec<u16> = chain.hops.iter().map(|hop| hop.status).collect();
        assert_eq!(statuses, vec![302, 302, 200]);
        assert!(chain.hops[2].url.ends_with("/2"));
        assert!(!chain.truncated);
    }

    #[tokio::test]
    async fn test_resolve_stops_after_max_hops() {
        let start = serve_redirects(usize::MAX, MAX_HOPS + 1);
        let chain = resolve(&client().unwrap(), start).await.unwrap();

        assert_eq!(chain.hops.len(), MAX_HOPS + 1);
        assert!(chain.hops.iter().all(|hop| hop.status == 302));
        assert!(chain.truncated);
    }

    #[test]
    fn test_relative_location() {
        let current = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(
            next_location(&current, "/c").unwrap().as_str(),
            "https://example.com/c"
        );
        assert_eq!(
            next_location(&current, "https://other.org/").unwrap().as_str(),
            "https://other.org/"
        );
    }
}
