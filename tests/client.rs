mod common;

use std::sync::Arc;

use common::{decode_request, respond, Outcome, ScriptedTransport};
use msp_gateway::amf::AmfValue;
use msp_gateway::client::msp::{BLOCK_ACTOR, GET_PIGGY_BANK, LOGIN};
use msp_gateway::client::AwardData;
use msp_gateway::{
    checksum, CallArgument, ClientConfig, GatewayError, MspClient, Server, TicketHeader, TicketValue,
};

const TICKET: &str = "A,123,B,C,D,EFGHIJ";

fn client(transport: ScriptedTransport) -> MspClient<ScriptedTransport> {
    MspClient::with_transport(ClientConfig::default(), Arc::new(transport))
}

fn logged_in(transport: ScriptedTransport) -> MspClient<ScriptedTransport> {
    let client = client(transport);
    client.resume(Server::Gb, "tester", TicketValue::parse(TICKET).unwrap());
    client
}

fn login_response(status: &str) -> CallArgument {
    CallArgument::mapping([(
        "loginStatus",
        CallArgument::mapping([
            ("status", CallArgument::from(status)),
            ("ticket", CallArgument::from(TICKET)),
            ("userType", CallArgument::from("Regular")),
            (
                "nebulaLoginStatus",
                CallArgument::mapping([("accessToken", "tok"), ("profileId", "pid")]),
            ),
        ]),
    )])
}

fn ticket_param(params: &[AmfValue]) -> String {
    params[0]
        .get("Ticket")
        .and_then(AmfValue::as_str)
        .expect("ticket header object")
        .to_string()
}

#[tokio::test]
async fn login_establishes_session() {
    let c = client(ScriptedTransport::always(respond(login_response("Success"))));
    assert!(!c.is_logged_in());

    let status = c.login("tester", "secret", Server::De, None).await.unwrap();
    assert!(status.is_logged_in());
    assert_eq!(status.actor_id(), Some(123));
    assert!(c.is_logged_in());

    let session = c.session().unwrap();
    assert_eq!(session.server, Server::De);
    assert_eq!(session.username, "tester");
    assert_eq!(session.actor_id, 123);
    assert_eq!(session.access_token.as_deref(), Some("tok"));
    assert_eq!(session.profile_id.as_deref(), Some("pid"));

    let request = c.dispatcher().transport().last_request();
    assert!(request.url.ends_with(&format!("method={}", LOGIN)));
    let (_, params) = decode_request(&request);
    assert_eq!(params.len(), 6);
    assert_eq!(params[0], AmfValue::String("tester".into()));
    assert_eq!(params[2], AmfValue::Array(vec![]));
    assert!(params[3].is_null() && params[4].is_null());
    assert_eq!(params[5], AmfValue::String("MSP1-Standalone:XXXXXX".into()));
}

#[tokio::test]
async fn rejected_login_keeps_client_anonymous() {
    let c = client(ScriptedTransport::always(respond(login_response("InvalidCredentials"))));
    let status = c.login("tester", "wrong", Server::De, None).await.unwrap();
    assert!(!status.is_logged_in());
    assert!(c.session().is_none());

    let c = client(ScriptedTransport::always(Outcome::Timeout));
    let status = c.login("tester", "secret", Server::De, None).await.unwrap();
    assert_eq!(status.user_ip, -1);
    assert!(!c.is_logged_in());
}

#[tokio::test]
async fn authenticated_calls_fail_fast_without_login() {
    let c = client(ScriptedTransport::always(respond(CallArgument::Null)));
    assert!(matches!(c.get_piggy_bank(None).await, Err(GatewayError::AuthenticationRequired)));
    assert!(matches!(c.block_user(5, None).await, Err(GatewayError::AuthenticationRequired)));
    assert!(matches!(c.ticket_header(), Err(GatewayError::AuthenticationRequired)));
    assert_eq!(c.dispatcher().transport().calls(), 0);
}

#[tokio::test]
async fn each_call_gets_a_fresh_ticket_header() {
    let c = logged_in(ScriptedTransport::always(respond(CallArgument::Null)));
    c.get_piggy_bank(None).await.unwrap();
    c.get_piggy_bank(None).await.unwrap();

    let requests = c.dispatcher().transport().requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].url.contains("ws-gb.mspapis.com"));
    assert!(requests[0].url.ends_with(GET_PIGGY_BANK));

    let (_, first) = decode_request(&requests[0]);
    let (_, second) = decode_request(&requests[1]);
    assert_eq!(ticket_param(&first), format!("{}c4ca4238a0b923820dcc509a6f75849b31", TICKET));
    assert_eq!(ticket_param(&second), format!("{}c81e728d9d4c2f636f067f89cc14862c32", TICKET));
    assert!(first[0].get("anyAttribute").map_or(false, AmfValue::is_null));
}

#[tokio::test]
async fn retries_reuse_the_same_ticket_header() {
    let transport = ScriptedTransport::new(vec![Outcome::Timeout], respond(CallArgument::Null));
    let c = logged_in(transport);
    c.get_piggy_bank(None).await.unwrap();

    let requests = c.dispatcher().transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
    let (_, params) = decode_request(&requests[1]);
    assert!(ticket_param(&params).ends_with("31"));
}

#[tokio::test]
async fn checksum_covers_the_ticket_fragment() {
    let c = logged_in(ScriptedTransport::always(respond(CallArgument::from(0i64))));
    assert!(c.block_user(42, None).await.unwrap());

    let request = c.dispatcher().transport().last_request();
    assert!(request.url.ends_with(BLOCK_ACTOR));
    let (headers, params) = decode_request(&request);
    assert_eq!(params[1], AmfValue::Integer(123));
    assert_eq!(params[2], AmfValue::Integer(42));

    let signed = ticket_param(&params);
    let expected = checksum(
        &[
            CallArgument::Ticket(TicketHeader::new(signed, 1)),
            CallArgument::from(123i64),
            CallArgument::from(42i64),
        ],
        &ClientConfig::default().preset,
    );
    assert_eq!(headers[2].as_str(), Some(expected.as_str()));
}

#[tokio::test]
async fn block_user_only_succeeds_on_zero() {
    let c = logged_in(ScriptedTransport::new(
        vec![respond(CallArgument::from(1i64)), Outcome::Respond(500, bytes::Bytes::new())],
        respond(CallArgument::from(0i64)),
    ));
    assert!(!c.block_user(1, None).await.unwrap());
    assert!(!c.block_user(1, None).await.unwrap());
    assert!(c.block_user(1, None).await.unwrap());
}

#[tokio::test]
async fn typed_endpoints_map_content() {
    let award = CallArgument::mapping([(
        "Data",
        CallArgument::mapping([("Starcoins", 100i64), ("Diamonds", 2), ("Fame", 50)]),
    )]);
    let piggy = CallArgument::mapping([(
        "Data",
        CallArgument::mapping([("StarCoins", 10i64), ("PiggyBankState", 1)]),
    )]);
    let search = CallArgument::sequence([
        CallArgument::mapping([("ActorId", CallArgument::from(9i64)), ("Name", CallArgument::from("bob"))]),
        CallArgument::mapping([("ActorId", CallArgument::from(10i64)), ("IsVIP", CallArgument::from(true))]),
    ]);
    let autograph = CallArgument::mapping([("Fame", 5i64), ("Timestamp", 1700000000)]);

    let c = logged_in(ScriptedTransport::new(
        vec![
            respond(award),
            respond(piggy),
            respond(search),
            respond(autograph),
            respond(CallArgument::from(3i64)),
            respond(CallArgument::from(true)),
        ],
        Outcome::Timeout,
    ));

    let award = c.claim_reward("daily", None).await.unwrap();
    assert_eq!((award.starcoins, award.diamonds, award.fame), (100, 2, 50));

    let piggy = c.get_piggy_bank(None).await.unwrap();
    assert_eq!(piggy.star_coins, 10);
    assert_eq!(piggy.piggy_bank_state, 1);
    assert_eq!(piggy.diamonds, 0);

    let actors = c.search_actor_by_name("bo", None).await.unwrap();
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0].name.as_deref(), Some("bob"));
    assert!(actors[1].is_vip);

    let autograph = c.send_autograph(9, None).await.unwrap();
    assert_eq!(autograph.fame, 5);
    assert_eq!(autograph.timestamp, 1_700_000_000);

    assert!(c.recycle_item(77, 0, None).await.unwrap());
    assert!(c.create_snapshot_small_and_big(vec![1; 64], vec![2; 128], None).await.unwrap());

    let requests = c.dispatcher().transport().requests();
    let (_, claim) = decode_request(&requests[0]);
    assert_eq!(claim[1], AmfValue::String("daily".into()));
    assert_eq!(claim[2], AmfValue::Integer(123));
    let (_, snapshot) = decode_request(&requests[5]);
    assert_eq!(snapshot.len(), 7);
    assert_eq!(snapshot[2], AmfValue::String("moviestar".into()));
    assert_eq!(snapshot[4], AmfValue::ByteArray(vec![1; 64]));
    assert_eq!(snapshot[6], AmfValue::String("jpg".into()));

    // marking ids kept climbing across endpoints
    assert!(ticket_param(&snapshot).ends_with(&hex::encode("6")));
}

#[tokio::test]
async fn failed_calls_map_to_defaults() {
    let c = logged_in(ScriptedTransport::always(Outcome::Timeout));
    assert_eq!(c.claim_reward("daily", None).await.unwrap(), AwardData::default());
    assert!(c.search_actor_by_name("x", None).await.unwrap().is_empty());
    assert!(!c.recycle_item(1, 1, None).await.unwrap());
}
