use google_sheets4::{
    hyper::{self, client::HttpConnector},
    hyper_rustls::{self, HttpsConnector},
};

pub type HttpClient = hyper::Client<HttpsConnector<HttpConnector>>;

/// Client shared by the Google authenticators and the Sheets hub. Fails when the
/// platform certificate store cannot be loaded.
pub fn http_client() -> std::io::Result<HttpClient> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();
    Ok(hyper::Client::builder().build(connector))
}

