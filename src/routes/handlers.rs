use std::time::{Duration, Instant};

use log::{debug, o};
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::environment::Environment;
use crate::errors::BotError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn hand_list(environment: Environment) -> RouteResult {
    timed! {
        let slots = environment
            .bot
            .hand_list()
            .await
            .map_err(|e: BotError| Rejection::new(Context::hand_list(), e))?;

        json(&SuccessResponse::hands(slots))
    }
}

pub async fn handup(environment: Environment, team: String, hour: i64) -> RouteResult {
    timed! {
        let logger = environment.logger.new(o!("team" => team.clone(), "hour" => hour));
        debug!(logger, "Raising hand...");

        let tag = environment
            .bot
            .handup(&team, hour)
            .await
            .map_err(|e: BotError| Rejection::new(Context::hand(team.clone(), hour), e))?;

        with_status(json(&SuccessResponse::Raised { team, hour, tag }), StatusCode::CREATED)
    }
}

pub async fn handdown(environment: Environment, team: String, hour: i64) -> RouteResult {
    timed! {
        let logger = environment.logger.new(o!("team" => team.clone(), "hour" => hour));
        debug!(logger, "Lowering hand...");

        let report = environment
            .bot
            .handdown(&team, hour)
            .await
            .map_err(|e: BotError| Rejection::new(Context::hand(team.clone(), hour), e))?;

        json(&SuccessResponse::lowered(&report))
    }
}

pub async fn admin_handup(environment: Environment, team: String, hour: i64) -> RouteResult {
    timed! {
        let logger = environment.logger.new(o!("team" => team.clone(), "hour" => hour));
        debug!(logger, "Raising hand on behalf of team...");

        let tag = environment
            .bot
            .admin_handup(&team, hour)
            .await
            .map_err(|e: BotError| Rejection::new(Context::hand(team.clone(), hour), e))?;

        with_status(json(&SuccessResponse::Raised { team, hour, tag }), StatusCode::CREATED)
    }
}

pub async fn admin_handdown(environment: Environment, team: String, hour: i64) -> RouteResult {
    timed! {
        let logger = environment.logger.new(o!("team" => team.clone(), "hour" => hour));
        debug!(logger, "Lowering hand on behalf of team...");

        let report = environment
            .bot
            .admin_handdown(&team, hour)
            .await
            .map_err(|e: BotError| Rejection::new(Context::hand(team.clone(), hour), e))?;

        json(&SuccessResponse::lowered(&report))
    }
}

pub async fn all_handdown(environment: Environment) -> RouteResult {
    timed! {
        debug!(environment.logger, "Lowering every hand...");

        let report = environment
            .bot
            .all_handdown()
            .await
            .map_err(|e: BotError| Rejection::new(Context::all_handdown(), e))?;

        json(&SuccessResponse::lowered(&report))
    }
}

pub async fn match_slot(environment: Environment, hour: i64) -> RouteResult {
    timed! {
        let result = environment
            .bot
            .match_slot(hour)
            .await
            .map_err(|e: BotError| Rejection::new(Context::match_slot(hour), e))?;

        json(&SuccessResponse::matched(result, &environment.bot.config().deprioritized_label))
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
