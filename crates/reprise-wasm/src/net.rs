//! Browser fetch wrappers

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

async fn fetch(url: &str, method: &str) -> Result<Response, JsValue> {
    let init = RequestInit::new();
    init.set_method(method);
    let request = Request::new_with_str_and_init(url, &init)?;
    let response = JsFuture::from(crate::dom::window()?.fetch_with_request(&request)).await?;
    response.dyn_into::<Response>()
}

/// HEAD `url` and return the status code
pub async fn head_status(url: &str) -> Result<u16, JsValue> {
    Ok(fetch(url, "HEAD").await?.status())
}

/// GET `url`; returns the status and body text
pub async fn get_text(url: &str) -> Result<(u16, String), JsValue> {
    let response = fetch(url, "GET").await?;
    let status = response.status();
    let body = JsFuture::from(response.text()?).await?;
    Ok((status, body.as_string().unwrap_or_default()))
}

/// GET `url` in the background, ignoring the response and any failure
pub fn fire_and_forget(url: String) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = fetch(&url, "GET").await {
            crate::debug(&format!("Request to {} dropped: {:?}", url, e));
        }
    });
}
