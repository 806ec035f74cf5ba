use std::sync::Arc;

use log::{error, warn, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::{BotError, MatchError};

pub mod admin;
mod handlers;
mod rejection;
mod response;

pub use internal::*;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Command failed"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            warn!(logger, "Command refused"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status));
    }

    Err(rej)
}

fn status_code_for(e: &BotError) -> StatusCode {
    use BotError::*;

    match e {
        UnknownHour(..) => StatusCode::BAD_REQUEST,
        UnknownTeam(..) => StatusCode::NOT_FOUND,
        OutsideWindow(..) => StatusCode::FORBIDDEN,
        AlreadyRaised { .. } => StatusCode::CONFLICT,
        Match {
            source: MatchError::InsufficientParticipants(..),
        } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post};

    use super::handlers;
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let $route_variable = warp::any()
                .map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_hand_list_route => hand_list, rt; p("hands"), end(), g());
    route!(make_handup_route => handup, rt; p("teams"), par::<String>(), p("hands"), par::<i64>(), end(), post());
    route!(make_handdown_route => handdown, rt; p("teams"), par::<String>(), p("hands"), par::<i64>(), end(), delete());
    route!(make_admin_handup_route => admin_handup, rt; p("teams"), par::<String>(), p("hands"), par::<i64>(), end(), post());
    route!(make_admin_handdown_route => admin_handdown, rt; p("teams"), par::<String>(), p("hands"), par::<i64>(), end(), delete());
    route!(make_all_handdown_route => all_handdown, rt; p("hands"), end(), delete());
    route!(make_match_route => match_slot, rt; p("match"), par::<i64>(), end(), post());

    /// The commands teams may call themselves.
    pub fn make_public_routes(environment: Environment) -> Route {
        make_handup_route(environment.clone())
            .or(make_handdown_route(environment))
            .unify()
            .boxed()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use time::{Date, Month, UtcOffset};

    use crate::announce::LogAnnouncer;
    use crate::bot::Bot;
    use crate::clock::FixedClock;
    use crate::environment::{Config, Environment};
    use crate::store::MemoryStore;
    use crate::team::Team;

    /// An environment at 15:00 Japan time with three teams on the roster.
    pub(crate) fn environment() -> (Environment, Arc<MemoryStore>) {
        let logger = Arc::new(log::discard());
        let store = Arc::new(MemoryStore::new(vec![
            Team::new("ut", "UT", 100),
            Team::new("hu", "HU", 200),
            Team::new("kmu", "KMU", 300).deprioritized(),
        ]));
        let now = Date::from_calendar_date(2024, Month::May, 1)
            .unwrap()
            .with_hms(15, 0, 0)
            .unwrap()
            .assume_offset(UtcOffset::from_hms(9, 0, 0).unwrap());

        let bot = Bot::new(
            Config::default(),
            store.clone(),
            Arc::new(FixedClock::new(now)),
            Arc::new(LogAnnouncer::new(logger.clone())),
            logger.clone(),
        );

        (Environment::new(logger, Arc::new(bot)), store)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use warp::Filter;

    use super::test_support::environment;
    use super::*;

    fn body<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn raising_and_listing_hands() {
        let (environment, _) = environment();
        let logger = environment.logger.clone();
        let filter = make_handup_route(environment.clone())
            .or(make_hand_list_route(environment))
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .method("POST")
            .path("/teams/ut/hands/21")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), 201);
        assert!(response.headers().contains_key("server-timing"));
        let raised = body(&response);
        assert_eq!(raised["team"], "ut");
        assert_eq!(raised["hour"], 21);
        assert!(raised["tag"].as_str().unwrap().starts_with("time:"));

        let response = warp::test::request()
            .method("GET")
            .path("/hands")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), 200);
        let list = body(&response);
        assert_eq!(list["slots"][0]["hour"], 21);
        assert_eq!(list["slots"][0]["teams"][0]["id"], "ut");
        assert_eq!(list["slots"][0]["teams"][0]["tags"][0], raised["tag"]);
    }

    #[tokio::test]
    async fn errors_become_json_rejections() {
        let (environment, _) = environment();
        let logger = environment.logger.clone();
        let filter = make_handup_route(environment)
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .method("POST")
            .path("/teams/ut/hands/18")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(body(&response)["hour"], 18);

        let response = warp::test::request()
            .method("POST")
            .path("/teams/nobody/hands/21")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 404);
        assert_eq!(body(&response)["team"], "nobody");

        warp::test::request()
            .method("POST")
            .path("/teams/hu/hands/22")
            .reply(&filter)
            .await;
        let response = warp::test::request()
            .method("POST")
            .path("/teams/hu/hands/22")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 409);
        assert_eq!(
            body(&response)["message"],
            "Team hu has already raised a hand for 22:00"
        );
    }

    #[tokio::test]
    async fn public_routes_hide_the_hand_list() {
        let (environment, _) = environment();
        let filter = make_public_routes(environment);

        let response = warp::test::request()
            .method("POST")
            .path("/teams/ut/hands/21")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 201);

        let response = warp::test::request()
            .method("GET")
            .path("/hands")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn admin_commands_match_and_sweep() {
        let (environment, store) = environment();
        let logger = environment.logger.clone();
        let filter = make_admin_handup_route(environment.clone())
            .or(make_match_route(environment.clone()))
            .or(make_all_handdown_route(environment))
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .method("POST")
            .path("/match/20")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 422);

        for team in &["ut", "hu", "kmu"] {
            let response = warp::test::request()
                .method("POST")
                .path(&format!("/teams/{}/hands/20", team))
                .reply(&filter)
                .await;
            assert_eq!(response.status(), 201);
        }

        let response = warp::test::request()
            .method("POST")
            .path("/match/20")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        let matched = body(&response);
        assert_eq!(matched["excluded"]["id"], "kmu");
        assert_eq!(matched["pairs"].as_array().unwrap().len(), 1);

        let response = warp::test::request()
            .method("DELETE")
            .path("/hands")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        // every hand was raised in the same second, so they share one tag
        let lowered = body(&response);
        assert_eq!(lowered["removed"].as_array().unwrap().len(), 1);
        assert!(lowered["failed"].as_array().unwrap().is_empty());
        for team in &["ut", "hu", "kmu"] {
            assert!(store.tags_of(team).unwrap().is_empty());
        }
    }
}
