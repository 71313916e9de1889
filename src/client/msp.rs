use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use super::entities::{AwardData, Autograph, FromAmf, LoginStatus, PiggyBank, SearchActor};
use crate::amf::AmfValue;
use crate::auth::{AuthorizationTicket, TicketHeader, TicketValue};
use crate::checksum::CallArgument;
use crate::gateway::{AmfResult, ClientConfig, Dispatcher, ReqwestTransport, Server, Transport};
use crate::utils::errors::{GatewayError, Result};

pub const LOGIN: &str = "MovieStarPlanet.WebService.User.AMFUserServiceWeb.Login";
pub const CLAIM_REWARD: &str = "MovieStarPlanet.WebService.Achievement.AMFAchievementWebService.ClaimReward";
pub const BLOCK_ACTOR: &str = "MovieStarPlanet.WebService.ActorService.AMFActorServiceForWeb.BlockActor";
pub const GET_PIGGY_BANK: &str = "MovieStarPlanet.WebService.PiggyBank.AMFPiggyBankService.GetPiggyBank";
pub const SEARCH_ACTOR_BY_NAME: &str =
    "MovieStarPlanet.WebService.ActorService.AMFActorServiceForWeb.SearchActorByNameNeb";
pub const RECYCLE_ITEM: &str = "MovieStarPlanet.WebService.Profile.AMFProfileService.RecycleItem";
pub const GIVE_AUTOGRAPH: &str =
    "MovieStarPlanet.WebService.UserSession.AMFUserSessionService.GiveAutographAndCalculateTimestamp";
pub const CREATE_SNAPSHOT: &str =
    "MovieStarPlanet.MobileServices.AMFGenericSnapshotService.CreateSnapshotSmallAndBig";

/// Client tag the desktop app sends with its login.
pub const LOGIN_CLIENT_TAG: &str = "MSP1-Standalone:XXXXXX";

/// State established by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub server: Server,
    pub username: String,
    pub actor_id: i64,
    pub access_token: Option<String>,
    pub profile_id: Option<String>,
}

/// High level client: one dispatcher, one ticket authorizer and the session
/// they serve. Authenticated endpoints fail with `AuthenticationRequired`
/// before doing any work when there is no session, and build exactly one
/// fresh ticket header per call.
pub struct MspClient<T: Transport = ReqwestTransport> {
    dispatcher: Dispatcher<T>,
    authorizer: AuthorizationTicket,
    session: RwLock<Option<Session>>,
}

impl MspClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::from_dispatcher(Dispatcher::from_config(config))
    }
}

impl<T: Transport> MspClient<T> {
    pub fn with_transport(config: ClientConfig, transport: Arc<T>) -> Self {
        Self::from_dispatcher(Dispatcher::new(config, transport))
    }

    fn from_dispatcher(dispatcher: Dispatcher<T>) -> Self {
        Self {
            dispatcher,
            authorizer: AuthorizationTicket::new(),
            session: RwLock::new(None),
        }
    }

    /// Adopt a ticket obtained elsewhere instead of logging in.
    pub fn resume(&self, server: Server, username: impl Into<String>, ticket: TicketValue) {
        let session = Session {
            server,
            username: username.into(),
            actor_id: ticket.actor_id(),
            access_token: None,
            profile_id: None,
        };
        self.authorizer.set_ticket(ticket);
        *self.session.write() = Some(session);
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.read().is_some() && self.authorizer.is_authenticated()
    }

    /// Fresh signed header for the next authenticated call.
    pub fn ticket_header(&self) -> Result<TicketHeader> {
        self.authorizer.build()
    }

    /// Raw call passthrough.
    pub async fn send_command(
        &self,
        server: &Server,
        method: &str,
        params: Vec<CallArgument>,
        proxy: Option<&str>,
    ) -> Result<AmfResult> {
        self.dispatcher.send(server, method, params, proxy).await
    }

    fn require_session(&self) -> Result<Session> {
        self.session.read().clone().ok_or(GatewayError::AuthenticationRequired)
    }

    /// Checks the session, then prepends a fresh ticket header to `params`.
    async fn send_authenticated<F>(&self, method: &str, params: F, proxy: Option<&str>) -> Result<AmfResult>
    where
        F: FnOnce(&Session) -> Vec<CallArgument>,
    {
        let session = self.require_session()?;
        let header = self.authorizer.build()?;
        let mut call = vec![CallArgument::Ticket(header)];
        call.extend(params(&session));
        self.dispatcher.send(&session.server, method, call, proxy).await
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        server: Server,
        proxy: Option<&str>,
    ) -> Result<LoginStatus> {
        let params = vec![
            CallArgument::from(username),
            CallArgument::from(password),
            CallArgument::Sequence(Vec::new()),
            CallArgument::Null,
            CallArgument::Null,
            CallArgument::from(LOGIN_CLIENT_TAG),
        ];
        let result = self.dispatcher.send(&server, LOGIN, params, proxy).await?;

        let status = match (result.is_ok(), result.content()) {
            (true, Some(content)) => content.get("loginStatus").map(LoginStatus::from_amf).unwrap_or_default(),
            _ => LoginStatus::default(),
        };

        if !status.is_logged_in() {
            warn!(username, status = ?status.status, http = result.status_code(), "login rejected");
            return Ok(status);
        }

        let raw = status.ticket.clone().unwrap_or_default();
        let ticket = TicketValue::parse(raw)?;
        let session = Session {
            server,
            username: username.to_string(),
            actor_id: ticket.actor_id(),
            access_token: status.nebula_login_status.access_token.clone(),
            profile_id: status.nebula_login_status.profile_id.clone(),
        };
        info!(username, actor_id = session.actor_id, %server, "logged in");
        self.authorizer.set_ticket(ticket);
        *self.session.write() = Some(session);
        Ok(status)
    }

    pub async fn claim_reward(&self, award_type: &str, proxy: Option<&str>) -> Result<AwardData> {
        let result = self
            .send_authenticated(
                CLAIM_REWARD,
                |s| vec![CallArgument::from(award_type), CallArgument::from(s.actor_id)],
                proxy,
            )
            .await?;
        Ok(data_field(&result).map(AwardData::from_amf).unwrap_or_default())
    }

    /// `true` when the gateway answers `0`.
    pub async fn block_user(&self, actor_id: i64, proxy: Option<&str>) -> Result<bool> {
        let result = self
            .send_authenticated(
                BLOCK_ACTOR,
                |s| vec![CallArgument::from(s.actor_id), CallArgument::from(actor_id)],
                proxy,
            )
            .await?;
        Ok(ok_content(&result).and_then(AmfValue::as_i64) == Some(0))
    }

    pub async fn get_piggy_bank(&self, proxy: Option<&str>) -> Result<PiggyBank> {
        let result = self.send_authenticated(GET_PIGGY_BANK, |_| Vec::new(), proxy).await?;
        Ok(data_field(&result).map(PiggyBank::from_amf).unwrap_or_default())
    }

    pub async fn search_actor_by_name(&self, name: &str, proxy: Option<&str>) -> Result<Vec<SearchActor>> {
        let result = self
            .send_authenticated(
                SEARCH_ACTOR_BY_NAME,
                |s| vec![CallArgument::from(s.actor_id), CallArgument::from(name)],
                proxy,
            )
            .await?;
        let actors = ok_content(&result)
            .and_then(AmfValue::as_array)
            .map(|items| items.iter().map(SearchActor::from_amf).collect())
            .unwrap_or_default();
        Ok(actors)
    }

    /// `true` when the gateway reports a positive count.
    pub async fn recycle_item(
        &self,
        item_rel_id: i64,
        actor_click_item: i64,
        proxy: Option<&str>,
    ) -> Result<bool> {
        let result = self
            .send_authenticated(
                RECYCLE_ITEM,
                |s| {
                    vec![
                        CallArgument::from(s.actor_id),
                        CallArgument::from(item_rel_id),
                        CallArgument::from(actor_click_item),
                    ]
                },
                proxy,
            )
            .await?;
        Ok(ok_content(&result).and_then(AmfValue::as_i64).map_or(false, |n| n > 0))
    }

    pub async fn send_autograph(&self, actor_id: i64, proxy: Option<&str>) -> Result<Autograph> {
        let result = self
            .send_authenticated(
                GIVE_AUTOGRAPH,
                |s| vec![CallArgument::from(s.actor_id), CallArgument::from(actor_id)],
                proxy,
            )
            .await?;
        Ok(ok_content(&result).map(Autograph::from_amf).unwrap_or_default())
    }

    /// Upload the small and full size profile snapshots (JPEG bytes).
    pub async fn create_snapshot_small_and_big(
        &self,
        small: Vec<u8>,
        big: Vec<u8>,
        proxy: Option<&str>,
    ) -> Result<bool> {
        let result = self
            .send_authenticated(
                CREATE_SNAPSHOT,
                |s| {
                    vec![
                        CallArgument::from(s.actor_id),
                        CallArgument::from("moviestar"),
                        CallArgument::from("fullSizeMovieStar"),
                        CallArgument::bytes(small),
                        CallArgument::bytes(big),
                        CallArgument::from("jpg"),
                    ]
                },
                proxy,
            )
            .await?;
        Ok(ok_content(&result).and_then(AmfValue::as_bool).unwrap_or(false))
    }
}

fn ok_content(result: &AmfResult) -> Option<&AmfValue> {
    if result.is_ok() {
        result.content()
    } else {
        None
    }
}

/// Non-null `Data` field of a 200 response.
fn data_field(result: &AmfResult) -> Option<&AmfValue> {
    ok_content(result)?.get("Data").filter(|data| !data.is_null())
}
