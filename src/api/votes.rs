use std::net::IpAddr;

use chrono::Utc;
use mongodb::Client;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            results::ContestResults,
            vote::{VoteReceipt, VoteRequest},
        },
        common::ContestId,
        db::{contest::Contest, contestant::Contestant, vote::Vote},
        ledger::cast_vote,
        mongodb::{Coll, Counter},
        tally::ContestSnapshot,
    },
};

pub fn routes() -> Vec<Route> {
    routes![vote, get_results]
}

/// Cast a vote. If the client doesn't report its own IP address, the address
/// the request came from is recorded instead.
#[post("/votes", data = "<request>", format = "json")]
async fn vote(
    request: Json<VoteRequest>,
    client_ip: Option<IpAddr>,
    contests: Coll<Contest>,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    counters: Coll<Counter>,
    db_client: &State<Client>,
) -> Result<(Status, Json<VoteReceipt>)> {
    let mut request = request.0;
    if request.ip_address.is_none() {
        request.ip_address = client_ip.map(|ip| ip.to_string());
    }

    let vote = cast_vote(
        request,
        Utc::now(),
        db_client,
        &contests,
        &contestants,
        &votes,
        &counters,
    )
    .await?;
    Ok((Status::Created, Json(vote.into())))
}

#[get("/votes/results/<contest_id>")]
async fn get_results(
    contest_id: ContestId,
    contests: Coll<Contest>,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<Json<ContestResults>> {
    let snapshot =
        ContestSnapshot::read(db_client, &contests, &contestants, &votes, contest_id).await?;
    Ok(Json(snapshot.tally()))
}
