use log::info;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    Client,
};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            contestant::{ContestantDescription, ContestantSpec, ContestantUpdate},
        },
        common::{ContestId, ContestantId},
        db::{contest::Contest, contestant::Contestant, vote::Vote},
        mongodb::{retry_transient, touch, u32_id_filter, Coll, Counter, CONTESTANT_ID_COUNTER},
        tally::ContestSnapshot,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_contest_contestants,
        get_contestant,
        create_contestant,
        update_contestant,
        delete_contestant,
    ]
}

/// All of a contest's contestants, with their live vote counts.
#[get("/contestants/contest/<contest_id>")]
async fn get_contest_contestants(
    contest_id: ContestId,
    contests: Coll<Contest>,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<Json<Vec<ContestantDescription>>> {
    let snapshot =
        ContestSnapshot::read(db_client, &contests, &contestants, &votes, contest_id).await?;
    let descriptions = snapshot
        .contestants
        .iter()
        .map(|contestant| {
            ContestantDescription::new(contestant.clone(), snapshot.count_for(contestant.id))
        })
        .collect();
    Ok(Json(descriptions))
}

#[get("/contestants/<contestant_id>")]
async fn get_contestant(
    contestant_id: ContestantId,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
) -> Result<Json<ContestantDescription>> {
    let contestant = contestants
        .find_one(u32_id_filter(contestant_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Contestant {contestant_id}")))?;
    let vote_count = votes
        .count_documents(doc! {"contestant_id": contestant_id}, None)
        .await?;
    Ok(Json(ContestantDescription::new(contestant, vote_count)))
}

#[post("/contestants", data = "<spec>", format = "json")]
async fn create_contestant(
    token: AuthToken,
    spec: Json<ContestantSpec>,
    contests: Coll<Contest>,
    contestants: Coll<Contestant>,
    counters: Coll<Counter>,
    db_client: &State<Client>,
) -> Result<(Status, Json<ContestantDescription>)> {
    spec.validate()?;

    let id = Counter::next(&counters, CONTESTANT_ID_COUNTER).await?;
    let contestant = spec.0.into_contestant(id, BsonDateTime::now().to_chrono());
    retry_transient("contestant insert", || {
        insert_contestant(&contestant, &contests, &contestants, db_client)
    })
    .await?;

    info!(
        "Admin {} added contestant {id} to contest {}",
        token.subject, contestant.contest_id
    );
    Ok((Status::Created, Json(ContestantDescription::new(contestant, 0))))
}

/// Insert a contestant, provided its contest exists.
async fn insert_contestant(
    contestant: &Contestant,
    contests: &Coll<Contest>,
    contestants: &Coll<Contestant>,
    db_client: &Client,
) -> Result<()> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    // Touch the contest, so deleting it concurrently conflicts with this insert.
    let contest_id = contestant.contest_id;
    let touched = contests
        .update_one_with_session(u32_id_filter(contest_id), touch(), None, &mut session)
        .await?;
    if touched.matched_count == 0 {
        return Err(Error::not_found(format!("Contest {contest_id}")));
    }
    contestants
        .insert_one_with_session(contestant, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(())
}

#[put("/contestants/<contestant_id>", data = "<update>", format = "json")]
async fn update_contestant(
    token: AuthToken,
    contestant_id: ContestantId,
    update: Json<ContestantUpdate>,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<Json<ContestantDescription>> {
    update.validate()?;

    let description = retry_transient("contestant update", || {
        apply_update(
            contestant_id,
            update.0.clone(),
            &contestants,
            &votes,
            db_client,
        )
    })
    .await?;

    info!("Admin {} updated contestant {contestant_id}", token.subject);
    Ok(Json(description))
}

async fn apply_update(
    contestant_id: ContestantId,
    update: ContestantUpdate,
    contestants: &Coll<Contestant>,
    votes: &Coll<Vote>,
    db_client: &Client,
) -> Result<ContestantDescription> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let mut contestant = contestants
        .find_one_with_session(u32_id_filter(contestant_id), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Contestant {contestant_id}")))?;
    update.apply(&mut contestant);
    contestants
        .replace_one_with_session(
            u32_id_filter(contestant_id),
            &contestant,
            None,
            &mut session,
        )
        .await?;
    let vote_count = votes
        .count_documents_with_session(doc! {"contestant_id": contestant_id}, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(ContestantDescription::new(contestant, vote_count))
}

/// Delete a contestant along with the votes cast for them.
#[delete("/contestants/<contestant_id>")]
async fn delete_contestant(
    token: AuthToken,
    contestant_id: ContestantId,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<()> {
    let votes_deleted = retry_transient("contestant delete", || {
        delete_with_votes(contestant_id, &contestants, &votes, db_client)
    })
    .await?;

    info!(
        "Admin {} deleted contestant {contestant_id} and {votes_deleted} votes",
        token.subject
    );
    Ok(())
}

/// Delete a contestant and their votes, returning how many votes went.
async fn delete_with_votes(
    contestant_id: ContestantId,
    contestants: &Coll<Contestant>,
    votes: &Coll<Vote>,
    db_client: &Client,
) -> Result<u64> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = contestants
        .delete_one_with_session(u32_id_filter(contestant_id), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Contestant {contestant_id}")));
    }
    let votes_deleted = votes
        .delete_many_with_session(doc! {"contestant_id": contestant_id}, None, &mut session)
        .await?
        .deleted_count;

    session.commit_transaction().await?;
    Ok(votes_deleted)
}
