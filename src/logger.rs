use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request currently being served, when called from inside
/// `LoggerMiddleware`. Error bodies use it as their `error_id`.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Per-request tracing span plus a completion line with status and latency.
///
/// The request id is shared by the span, the `x-request-id` response header
/// and any error body. Headers are never recorded, so tokens and cookies
/// stay out of the logs.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );

        let service = self.service.clone();

        let header_value = HeaderValue::from_str(&request_id).ok();

        let future = async move {
            let mut res = service.call(req).await?;

            if let Some(value) = header_value {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let status = res.status().as_u16();
            let elapsed_ms = start_time.elapsed().as_millis() as u64;

            if res.status().is_server_error() {
                tracing::error!(status, elapsed_ms, "Request failed");
            } else if res.status().is_client_error() {
                tracing::warn!(status, elapsed_ms, "Request rejected");
            } else {
                tracing::info!(status, elapsed_ms, "Request completed");
            }

            Ok(res)
        }
        .instrument(span);

        Box::pin(REQUEST_ID.scope(request_id, future))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_middleware_passes_responses_through() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("fine") }))
                .route(
                    "/teapot",
                    web::get().to(|| async { HttpResponse::ImATeapot().finish() }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/ok").to_request()).await;
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(test::read_body(res).await, "fine");

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/teapot").to_request()).await;
        assert_eq!(res.status().as_u16(), 418);
    }

    #[actix_web::test]
    async fn test_request_id_is_visible_to_handlers_and_returned() {
        let app = test::init_service(App::new().wrap(LoggerMiddleware).route(
            "/id",
            web::get().to(|| async {
                HttpResponse::Ok().body(current_request_id().unwrap_or_default())
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/id").to_request()).await;
        let header = res
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .expect("missing x-request-id");
        let body = test::read_body(res).await;

        assert!(!header.is_empty());
        assert_eq!(body, header.as_bytes());
    }

    #[::core::prelude::v1::test]
    fn test_no_request_id_outside_a_request() {
        assert!(current_request_id().is_none());
    }
}
