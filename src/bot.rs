use std::sync::Arc;

use log::{error, info, o, Logger};

use crate::announce::Announcer;
use crate::clock::Clock;
use crate::environment::Config;
use crate::errors::{BotError, MatchError};
use crate::marker::MarkerCodec;
use crate::matching::{MatchEngine, MatchResult};
use crate::registry::{DetachReport, Registry, SlotHands};
use crate::schedule::{Schedule, Trigger};
use crate::store::TeamStore;
use crate::team::Team;

/// The commands and scheduled jobs of the bot, wired to one team store.
pub struct Bot {
    config: Config,
    registry: Registry,
    engine: MatchEngine,
    schedule: Schedule,
    clock: Arc<dyn Clock>,
    announcer: Arc<dyn Announcer>,
    logger: Arc<Logger>,
}

impl Bot {
    pub fn new(
        config: Config,
        store: Arc<dyn TeamStore>,
        clock: Arc<dyn Clock>,
        announcer: Arc<dyn Announcer>,
        logger: Arc<Logger>,
    ) -> Self {
        let markers = MarkerCodec::new(
            config.tag_prefix.clone(),
            config.slot_hours.clone(),
            clock.clone(),
            logger.clone(),
        );
        let registry = Registry::new(markers, store, logger.clone());
        let engine = MatchEngine::new(config.exclusion_policy);
        let schedule = Schedule::new(
            config.slot_hours.clone(),
            config.recruitment,
            config.close_minutes,
            config.utc_offset,
        );

        Self {
            config,
            registry,
            engine,
            schedule,
            clock,
            announcer,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Raises `team`'s hand for `hour` while hands are being accepted.
    pub async fn handup(&self, team: &str, hour: i64) -> Result<String, BotError> {
        let hour = self.open_slot(hour)?;
        self.raise(team, hour).await
    }

    /// Raises `team`'s hand for `hour` regardless of the time of day.
    pub async fn admin_handup(&self, team: &str, hour: i64) -> Result<String, BotError> {
        let hour = self.slot(hour)?;
        self.raise(team, hour).await
    }

    /// Lowers `team`'s hands for `hour` while hands are being accepted.
    pub async fn handdown(&self, team: &str, hour: i64) -> Result<DetachReport, BotError> {
        let hour = self.open_slot(hour)?;
        self.lower(team, hour).await
    }

    /// Lowers `team`'s hands for `hour` regardless of the time of day.
    pub async fn admin_handdown(&self, team: &str, hour: i64) -> Result<DetachReport, BotError> {
        let hour = self.slot(hour)?;
        self.lower(team, hour).await
    }

    /// Lowers every known hand of every team.
    pub async fn all_handdown(&self) -> Result<DetachReport, BotError> {
        let teams = self.registry.store().teams().await?;

        Ok(self.registry.lower_all_known_hands(&teams).await)
    }

    pub async fn hand_list(&self) -> Result<Vec<SlotHands>, BotError> {
        let teams = self.registry.store().teams().await?;

        Ok(self.registry.hand_list(&teams))
    }

    /// Pairs the teams whose hands are currently raised for `hour`.
    pub async fn match_slot(&self, hour: i64) -> Result<MatchResult, BotError> {
        let hour = self.slot(hour)?;
        let teams = self.registry.store().teams().await?;
        let participants = self.registry.participants(&teams, hour);

        Ok(self.engine.pair_random(hour, participants)?)
    }

    /// Runs one scheduled job.
    pub async fn fire(&self, trigger: Trigger) -> Result<(), BotError> {
        match trigger {
            Trigger::RecruitmentOpen => self.on_recruitment_open().await.map(|_| ()),
            Trigger::SlotDeadline(hour) => self.on_slot_ingest_deadline(hour).await.map(|_| ()),
        }
    }

    /// Closes hands for `hour`, pairs the participants and announces the
    /// result.
    pub async fn on_slot_ingest_deadline(&self, hour: u8) -> Result<MatchResult, BotError> {
        let logger = self.logger.new(o!("hour" => hour));
        info!(logger, "Matching teams");

        match self.match_slot(hour.into()).await {
            Ok(result) => {
                info!(logger, "Matched teams"; "pairs" => result.pairs.len(), "excluded" => result.excluded.as_ref().map(|t| t.id.clone()));

                self.announcer
                    .announce(result.describe(&self.config.deprioritized_label))
                    .await;

                Ok(result)
            }
            Err(BotError::Match {
                source: MatchError::InsufficientParticipants(count),
            }) => {
                info!(logger, "Not enough teams to match"; "participants" => count);

                self.announcer
                    .announce(format!("Not enough teams raised a hand for {}:00", hour))
                    .await;

                Err(MatchError::InsufficientParticipants(count).into())
            }
            Err(e) => {
                error!(logger, "Matching failed"; "error" => ?e);

                self.announcer
                    .announce(format!("Matching for {}:00 failed", hour))
                    .await;

                Err(e)
            }
        }
    }

    /// Sweeps yesterday's hands and announces that recruitment is open.
    pub async fn on_recruitment_open(&self) -> Result<DetachReport, BotError> {
        let report = match self.all_handdown().await {
            Ok(report) => report,
            Err(e) => {
                error!(self.logger, "Sweep failed"; "error" => ?e);

                self.announcer
                    .announce("Could not clear yesterday's hands".to_owned())
                    .await;

                return Err(e);
            }
        };

        self.announcer.announce(describe_sweep(&report)).await;
        self.announcer
            .announce(format!(
                "## It is {}:{:02}, recruitment for today's matches is open",
                self.config.recruitment.hour, self.config.recruitment.minute
            ))
            .await;

        Ok(report)
    }

    fn slot(&self, hour: i64) -> Result<u8, BotError> {
        if self.config.slot_hours.contains(hour) {
            Ok(hour as u8)
        } else {
            Err(BotError::UnknownHour(hour))
        }
    }

    fn open_slot(&self, hour: i64) -> Result<u8, BotError> {
        let slot = self.slot(hour)?;

        if self.schedule.is_accepting(hour, self.clock.now()) {
            Ok(slot)
        } else {
            Err(BotError::OutsideWindow(slot))
        }
    }

    async fn team(&self, id: &str) -> Result<Team, BotError> {
        self.registry
            .store()
            .team(id)
            .await?
            .ok_or_else(|| BotError::UnknownTeam(id.to_owned()))
    }

    async fn raise(&self, team: &str, hour: u8) -> Result<String, BotError> {
        let team = self.team(team).await?;

        if self.registry.has_raised_hand(&team, hour) {
            return Err(BotError::AlreadyRaised { team: team.id, hour });
        }

        let tag = self.registry.raise_hand(&team, hour).await?;

        info!(self.logger, "Hand raised"; "team" => &team.id, "hour" => hour);

        Ok(tag)
    }

    async fn lower(&self, team: &str, hour: u8) -> Result<DetachReport, BotError> {
        let team = self.team(team).await?;
        let report = self
            .registry
            .lower_hands_for_hour(std::slice::from_ref(&team), hour)
            .await;

        info!(self.logger, "Hands lowered"; "team" => &team.id, "hour" => hour, "removed" => report.removed().len());

        Ok(report)
    }
}

fn describe_sweep(report: &DetachReport) -> String {
    let removed = report.removed();

    let mut message = if removed.is_empty() {
        "# Clearing yesterday's hands\nThere were no hands to clear".to_owned()
    } else {
        let list = removed
            .iter()
            .map(|tag| format!("- {}", tag))
            .collect::<Vec<_>>();

        format!("# Clearing yesterday's hands\n{}", list.join("\n"))
    };

    let failed = report.failed().count();
    if failed > 0 {
        message.push_str(&format!("\n{} hands could not be cleared", failed));
    }

    message
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::{BoxFuture, FutureExt};
    use time::{Date, Month, OffsetDateTime, UtcOffset};

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingAnnouncer(Mutex<Vec<String>>);

    impl RecordingAnnouncer {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn announce(&self, message: String) -> BoxFuture<()> {
            self.0.lock().unwrap().push(message);
            async {}.boxed()
        }
    }

    struct Fixture {
        bot: Bot,
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        announcer: Arc<RecordingAnnouncer>,
    }

    fn local(hour: u8, minute: u8) -> OffsetDateTime {
        Date::from_calendar_date(2024, Month::May, 1)
            .unwrap()
            .with_hms(hour, minute, 0)
            .unwrap()
            .assume_offset(UtcOffset::from_hms(9, 0, 0).unwrap())
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new(vec![
            Team::new("ut", "UT", 100),
            Team::new("hu", "HU", 200),
            Team::new("kmu", "KMU", 300),
            Team::new("tym", "tym", 400).deprioritized(),
        ]));
        let clock = Arc::new(FixedClock::new(local(15, 0)));
        let announcer = Arc::new(RecordingAnnouncer::default());

        let bot = Bot::new(
            Config::default(),
            store.clone(),
            clock.clone(),
            announcer.clone(),
            Arc::new(log::discard()),
        );

        Fixture {
            bot,
            store,
            clock,
            announcer,
        }
    }

    #[tokio::test]
    async fn raises_hands_inside_the_window() {
        let f = fixture();

        let tag = f.bot.handup("ut", 21).await.unwrap();
        assert!(f.store.tags_of("ut").unwrap().contains(&tag));

        assert_eq!(
            f.bot.handup("ut", 21).await,
            Err(BotError::AlreadyRaised {
                team: "ut".to_owned(),
                hour: 21
            })
        );
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let f = fixture();

        assert_eq!(f.bot.handup("ut", 18).await, Err(BotError::UnknownHour(18)));
        assert_eq!(
            f.bot.handup("nobody", 21).await,
            Err(BotError::UnknownTeam("nobody".to_owned()))
        );

        f.clock.set(local(20, 50));
        assert_eq!(f.bot.handup("ut", 21).await, Err(BotError::OutsideWindow(21)));
        assert_eq!(f.bot.handdown("ut", 21).await, Err(BotError::OutsideWindow(21)));
    }

    #[tokio::test]
    async fn hands_open_with_recruitment() {
        let f = fixture();
        f.clock.set(local(12, 10));

        assert_eq!(f.bot.handup("ut", 21).await, Err(BotError::OutsideWindow(21)));

        let opening = f.bot.schedule().due(local(12, 10), local(12, 40));
        assert_eq!(opening, vec![(local(12, 38), Trigger::RecruitmentOpen)]);
        f.bot.fire(Trigger::RecruitmentOpen).await.unwrap();

        f.clock.set(local(12, 40));
        let tag = f.bot.handup("ut", 21).await.unwrap();

        assert_eq!(f.store.tags_of("ut").unwrap().into_iter().collect::<Vec<_>>(), vec![tag]);
    }

    #[tokio::test]
    async fn admins_ignore_the_window() {
        let f = fixture();
        f.clock.set(local(9, 0));

        f.bot.admin_handup("hu", 19).await.unwrap();
        let report = f.bot.admin_handdown("hu", 19).await.unwrap();

        assert_eq!(report.removed().len(), 1);
        assert!(f.store.tags_of("hu").unwrap().is_empty());
    }

    #[tokio::test]
    async fn handdown_only_touches_the_callers_team() {
        let f = fixture();
        f.bot.handup("ut", 22).await.unwrap();
        f.bot.handup("hu", 22).await.unwrap();

        f.bot.handdown("ut", 22).await.unwrap();

        let list = f.bot.hand_list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].hour, 22);
        assert_eq!(list[0].teams.len(), 1);
        assert_eq!(list[0].teams[0].0.id, "hu");
    }

    #[tokio::test]
    async fn deadline_matches_and_announces() {
        let f = fixture();
        for team in &["ut", "hu", "kmu", "tym"] {
            f.bot.handup(team, 20).await.unwrap();
        }
        f.bot.handup("ut", 21).await.unwrap();

        let result = f.bot.on_slot_ingest_deadline(20).await.unwrap();

        assert_eq!(result.pairs.len(), 2);
        assert_eq!(result.excluded, None);

        let messages = f.announcer.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("## Matches for 20:00"));
        assert!(messages[0].contains("tym (fewest matches)"));
    }

    #[tokio::test]
    async fn deadline_excludes_the_deprioritized_team() {
        let f = fixture();
        for team in &["ut", "hu", "tym"] {
            f.bot.handup(team, 23).await.unwrap();
        }

        let result = f.bot.on_slot_ingest_deadline(23).await.unwrap();

        assert_eq!(result.excluded.map(|t| t.id), Some("tym".to_owned()));
        assert_eq!(result.pairs.len(), 1);
    }

    #[tokio::test]
    async fn deadline_with_too_few_teams_announces_and_fails() {
        let f = fixture();
        f.bot.handup("ut", 19).await.unwrap();

        let result = f.bot.on_slot_ingest_deadline(19).await;

        assert_eq!(
            result,
            Err(BotError::Match {
                source: MatchError::InsufficientParticipants(1)
            })
        );
        assert_eq!(
            f.announcer.messages(),
            vec!["Not enough teams raised a hand for 19:00".to_owned()]
        );
    }

    #[tokio::test]
    async fn recruitment_sweeps_every_hand() {
        let f = fixture();
        f.bot.handup("ut", 19).await.unwrap();
        f.bot.handup("hu", 23).await.unwrap();
        f.store.fail_detaches_for("hu");

        let report = f.bot.fire(Trigger::RecruitmentOpen).await;
        assert!(report.is_ok());

        let messages = f.announcer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("# Clearing yesterday's hands\n- time:"));
        assert!(messages[0].ends_with("1 hands could not be cleared"));
        assert!(messages[1].contains("recruitment for today's matches is open"));

        assert!(f.store.tags_of("ut").unwrap().is_empty());
        assert_eq!(f.store.tags_of("hu").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_sweeps_say_so() {
        let f = fixture();

        let report = f.bot.on_recruitment_open().await.unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(
            f.announcer.messages()[0],
            "# Clearing yesterday's hands\nThere were no hands to clear"
        );
    }
}
