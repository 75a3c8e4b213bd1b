use log::info;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::FindOptions,
    Client,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            contest::{ContestDescription, ContestSpec, ContestUpdate},
        },
        common::{ContestId, ContestStatus},
        db::{contest::Contest, contestant::Contestant, vote::Vote},
        mongodb::{retry_transient, u32_id_filter, Coll, Counter, CONTEST_ID_COUNTER},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_contests,
        get_active_contests,
        get_contest,
        create_contest,
        update_contest,
        delete_contest,
    ]
}

#[get("/contests")]
async fn get_contests(contests: Coll<Contest>) -> Result<Json<Vec<ContestDescription>>> {
    let by_id = FindOptions::builder().sort(doc! {"_id": 1}).build();
    let contest_list: Vec<Contest> = contests.find(None, by_id).await?.try_collect().await?;
    let descriptions = contest_list.into_iter().map(Into::into).collect();
    Ok(Json(descriptions))
}

/// Contests that are accepting votes right now.
#[get("/contests/active")]
async fn get_active_contests(contests: Coll<Contest>) -> Result<Json<Vec<ContestDescription>>> {
    let now = BsonDateTime::now();
    let filter = doc! {
        "status": ContestStatus::Active,
        "start_date": { "$lte": now },
        "end_date": { "$gte": now },
    };
    let by_id = FindOptions::builder().sort(doc! {"_id": 1}).build();
    let contest_list: Vec<Contest> = contests.find(filter, by_id).await?.try_collect().await?;
    let descriptions = contest_list.into_iter().map(Into::into).collect();
    Ok(Json(descriptions))
}

#[get("/contests/<contest_id>")]
async fn get_contest(
    contest_id: ContestId,
    contests: Coll<Contest>,
) -> Result<Json<ContestDescription>> {
    let contest = contests
        .find_one(u32_id_filter(contest_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Contest {contest_id}")))?;
    Ok(Json(contest.into()))
}

#[post("/contests", data = "<spec>", format = "json")]
async fn create_contest(
    token: AuthToken,
    spec: Json<ContestSpec>,
    contests: Coll<Contest>,
    counters: Coll<Counter>,
) -> Result<(Status, Json<ContestDescription>)> {
    spec.validate()?;

    let id = Counter::next(&counters, CONTEST_ID_COUNTER).await?;
    let contest = spec.0.into_contest(id, BsonDateTime::now().to_chrono());
    contests.insert_one(&contest, None).await?;

    info!("Admin {} created contest {id}", token.subject);
    Ok((Status::Created, Json(contest.into())))
}

#[put("/contests/<contest_id>", data = "<update>", format = "json")]
async fn update_contest(
    token: AuthToken,
    contest_id: ContestId,
    update: Json<ContestUpdate>,
    contests: Coll<Contest>,
    db_client: &State<Client>,
) -> Result<Json<ContestDescription>> {
    update.validate()?;

    let contest = retry_transient("contest update", || {
        apply_update(contest_id, update.0.clone(), &contests, db_client)
    })
    .await?;

    info!(
        "Admin {} updated contest {contest_id}, now {:?}",
        token.subject, contest.status
    );
    Ok(Json(contest.into()))
}

async fn apply_update(
    contest_id: ContestId,
    update: ContestUpdate,
    contests: &Coll<Contest>,
    db_client: &Client,
) -> Result<Contest> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let mut contest = contests
        .find_one_with_session(u32_id_filter(contest_id), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Contest {contest_id}")))?;
    update.apply(&mut contest)?;
    contests
        .replace_one_with_session(u32_id_filter(contest_id), &contest, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(contest)
}

/// Delete a contest along with its contestants and their votes.
#[delete("/contests/<contest_id>")]
async fn delete_contest(
    token: AuthToken,
    contest_id: ContestId,
    contests: Coll<Contest>,
    contestants: Coll<Contestant>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<()> {
    let (contestants_deleted, votes_deleted) = retry_transient("contest delete", || {
        delete_with_contents(contest_id, &contests, &contestants, &votes, db_client)
    })
    .await?;

    info!(
        "Admin {} deleted contest {contest_id} \
         ({contestants_deleted} contestants, {votes_deleted} votes)",
        token.subject
    );
    Ok(())
}

/// Delete a contest, its contestants and its votes, returning how many
/// contestants and votes went.
async fn delete_with_contents(
    contest_id: ContestId,
    contests: &Coll<Contest>,
    contestants: &Coll<Contestant>,
    votes: &Coll<Vote>,
    db_client: &Client,
) -> Result<(u64, u64)> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = contests
        .delete_one_with_session(u32_id_filter(contest_id), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Contest {contest_id}")));
    }

    let filter = doc! {
        "contest_id": contest_id,
    };
    let contestants_deleted = contestants
        .delete_many_with_session(filter.clone(), None, &mut session)
        .await?
        .deleted_count;
    let votes_deleted = votes
        .delete_many_with_session(filter, None, &mut session)
        .await?
        .deleted_count;

    session.commit_transaction().await?;
    Ok((contestants_deleted, votes_deleted))
}
