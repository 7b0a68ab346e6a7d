use crate::engine::assets::model_asset::strip_query;
use crate::engine::loading::error::LoadError;
use crate::engine::resources::object_url::PendingObjectUrls;
use bevy::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::JsFuture;

/// Fetch a URL's body as bytes.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = fetch_response(url).await?;
    let buffer_promise = response
        .array_buffer()
        .map_err(|e| LoadError::network(url, format!("{:?}", e)))?;
    let buffer = JsFuture::from(buffer_promise)
        .await
        .map_err(|e| LoadError::network(url, format!("{:?}", e)))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(target_arch = "wasm32")]
async fn fetch_response(url: &str) -> Result<web_sys::Response, LoadError> {
    use web_sys::{Request, RequestInit, RequestMode, Response};

    let window = web_sys::window().ok_or_else(|| LoadError::network(url, "no window"))?;
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_mode(RequestMode::Cors);
    let request = Request::new_with_str_and_init(url, &init)
        .map_err(|e| LoadError::network(url, format!("{:?}", e)))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| LoadError::network(url, format!("{:?}", e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| LoadError::network(url, "fetch did not return a Response"))?;
    if !response.ok() {
        return Err(LoadError::network(
            url,
            format!("HTTP {} {}", response.status(), response.status_text()),
        ));
    }
    Ok(response)
}

/// Re-fetch the query-less URL as a blob and read it back through an object URL.
#[cfg(target_arch = "wasm32")]
async fn fetch_via_blob(url: &str, pending: &PendingObjectUrls) -> Result<Vec<u8>, LoadError> {
    use crate::engine::resources::object_url::ObjectUrl;

    let plain = strip_query(url);
    let response = fetch_response(plain).await?;
    let blob_promise = response
        .blob()
        .map_err(|e| LoadError::network(plain, format!("{:?}", e)))?;
    let blob: web_sys::Blob = JsFuture::from(blob_promise)
        .await
        .map_err(|e| LoadError::network(plain, format!("{:?}", e)))?
        .dyn_into()
        .map_err(|_| LoadError::network(plain, "response body is not a Blob"))?;
    let object_url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|e| LoadError::network(plain, format!("{:?}", e)))?;
    let guard = ObjectUrl::new(object_url, pending);
    let bytes = fetch_bytes(guard.as_str()).await;
    drop(guard);
    bytes
}

/// Fetch a URL's body as bytes: HTTP(S) over the network, anything else from disk.
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, LoadError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        fetch_remote(url)
    } else {
        read_local(url)
    }
}

/// Blocking request; native fetches already run on their own task thread.
#[cfg(not(target_arch = "wasm32"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    use constants::path::REMOTE_FETCH_TIMEOUT_SECS;

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(REMOTE_FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| LoadError::network(url, e))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| LoadError::network(url, e))?;
    if !response.status().is_success() {
        return Err(LoadError::network(url, format!("HTTP {}", response.status())));
    }
    let bytes = response.bytes().map_err(|e| LoadError::network(url, e))?;
    Ok(bytes.to_vec())
}

#[cfg(not(target_arch = "wasm32"))]
fn read_local(url: &str) -> Result<Vec<u8>, LoadError> {
    let path = url.strip_prefix("file://").unwrap_or(url);
    std::fs::read(path).map_err(|e| LoadError::network(url, e))
}

/// Native builds have no blob store; retry the query-less URL instead.
#[cfg(not(target_arch = "wasm32"))]
async fn fetch_via_blob(url: &str, _pending: &PendingObjectUrls) -> Result<Vec<u8>, LoadError> {
    fetch_bytes(strip_query(url)).await
}

/// Direct fetch, falling back to the blob route when `allow_blob` is set.
pub async fn fetch_with_fallback(
    url: &str,
    allow_blob: bool,
    pending: &PendingObjectUrls,
) -> Result<Vec<u8>, LoadError> {
    match fetch_bytes(url).await {
        Ok(bytes) => Ok(bytes),
        Err(direct) if allow_blob => {
            warn!("Direct fetch failed ({}), retrying via blob", direct);
            fetch_via_blob(url, pending).await.map_err(|fallback| {
                LoadError::network(url, format!("{}; blob fallback: {}", direct, fallback))
            })
        }
        Err(direct) => Err(direct),
    }
}

/// Decode a `data:` URI payload. Only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    use base64::Engine;

    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_uri() {
        assert_eq!(
            decode_data_uri("data:application/octet-stream;base64,AAEC"),
            Some(vec![0, 1, 2])
        );
        assert_eq!(decode_data_uri("data:text/plain,hello"), None);
        assert_eq!(decode_data_uri("model.bin"), None);
    }

    /// Answer `requests` HTTP requests on a local port, picking each response by request line.
    fn serve(requests: usize, respond: fn(&str) -> (&'static str, &'static [u8])) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for _ in 0..requests {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = [0u8; 2048];
                let read = stream.read(&mut request).unwrap_or(0);
                let text = String::from_utf8_lossy(&request[..read]);
                let request_line = text.lines().next().unwrap_or_default().to_string();
                let (status, body) = respond(&request_line);
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(body).unwrap();
            }
        });
        format!("http://{}", address)
    }

    /// Signed URLs are refused; the plain path is served.
    fn reject_signed(request_line: &str) -> (&'static str, &'static [u8]) {
        if request_line.contains('?') {
            ("403 Forbidden", &b""[..])
        } else {
            ("200 OK", &b"Kaydara"[..])
        }
    }

    #[test]
    fn test_remote_url_is_fetched_natively() {
        let base = serve(1, |_| ("200 OK", &b"glTF"[..]));
        let bytes = pollster::block_on(fetch_bytes(&format!("{}/door.glb", base))).unwrap();
        assert_eq!(bytes, b"glTF");
    }

    #[test]
    fn test_remote_error_status_falls_back_without_query() {
        let base = serve(3, reject_signed);
        let signed = format!("{}/door.fbx?X-Amz-Signature=expired", base);
        let pending = PendingObjectUrls::default();

        let strict = pollster::block_on(fetch_bytes(&signed));
        assert!(matches!(strict, Err(LoadError::Network { .. })));

        let bytes = pollster::block_on(fetch_with_fallback(&signed, true, &pending)).unwrap();
        assert_eq!(bytes, b"Kaydara");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_native_fallback_strips_query() {
        let dir = std::env::temp_dir().join("preview_fetch_fallback");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("door.glb");
        std::fs::write(&file, b"glTF").unwrap();

        let signed = format!("{}?X-Amz-Signature=abc", file.display());
        let pending = PendingObjectUrls::default();
        let bytes = pollster::block_on(fetch_with_fallback(&signed, true, &pending)).unwrap();
        assert_eq!(bytes, b"glTF");

        let strict = pollster::block_on(fetch_with_fallback(&signed, false, &pending));
        assert!(matches!(strict, Err(LoadError::Network { .. })));
        assert!(pending.is_empty());
    }
}
