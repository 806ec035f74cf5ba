use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

pub fn make_healthz_route(
    _environment: Environment,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("healthz").and(warp::get()).map(move || {
        json(&SuccessResponse::Healthz {
            revision: info::REVISION,
            timestamp: info::BUILD_TIMESTAMP,
            version: info::VERSION,
        })
    })
}

type TerminationFuture<'a> = BoxFuture<'a, ()>;

pub type TerminationFunctionWrapper<'a> =
    Arc<dyn Fn() -> TerminationFuture<'a> + Send + Sync + 'a>;

pub fn make_termination_route<'a>(
    _environment: Environment,
    terminate: TerminationFunctionWrapper<'a>,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let handler = move || -> BoxFuture<'a, Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            let future = terminate();
            future.await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate").and(warp::post()).and_then(handler)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::routes::test_support::environment;

    #[tokio::test]
    async fn healthz_reports_version() {
        let (environment, _) = environment();
        let filter = make_healthz_route(environment);

        let response = warp::test::request()
            .method("GET")
            .path("/healthz")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["version"], info::VERSION);
    }

    #[tokio::test]
    async fn terminate_calls_back() {
        let (environment, _) = environment();
        let called = Arc::new(AtomicBool::new(false));

        let flag = called.clone();
        let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
            }
            .boxed()
        });

        let filter = make_termination_route(environment, terminate);

        let response = warp::test::request()
            .method("POST")
            .path("/terminate")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), 204);
        assert!(called.load(Ordering::SeqCst));
    }
}
