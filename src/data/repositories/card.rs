use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::data::models::{CardListParams, LearningRecord, NewStudyCard, StudyCard};
use crate::schema::{learning_records, study_cards, study_sessions};

pub struct CardRepository;

impl CardRepository {
    pub fn find_for_user(
        conn: &mut SqliteConnection,
        card_id: i32,
        user_id: i32,
    ) -> Result<Option<StudyCard>, diesel::result::Error> {
        study_cards::table
            .filter(study_cards::card_id.eq(card_id))
            .filter(study_cards::user_id.eq(user_id))
            .select(StudyCard::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists(
        conn: &mut SqliteConnection,
        card_id: i32,
    ) -> Result<bool, diesel::result::Error> {
        use diesel::dsl::exists;
        use diesel::select;

        select(exists(
            study_cards::table.filter(study_cards::card_id.eq(card_id)),
        ))
        .get_result(conn)
    }

    pub fn create(
        conn: &mut SqliteConnection,
        new_card: &NewStudyCard,
    ) -> Result<StudyCard, diesel::result::Error> {
        diesel::insert_into(study_cards::table)
            .values(new_card)
            .execute(conn)?;

        let card_id = diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()"))
            .get_result::<i32>(conn)?;

        study_cards::table
            .filter(study_cards::card_id.eq(card_id))
            .select(StudyCard::as_select())
            .first(conn)
    }

    /// A page of the user's cards matching the list filters, plus the total
    /// match count for pagination.
    pub fn list(
        conn: &mut SqliteConnection,
        user_id: i32,
        params: &CardListParams,
    ) -> Result<(Vec<StudyCard>, i64), diesel::result::Error> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * limit;

        // The status filter works over card ids resolved from the learning
        // records, so the same id set applies to both the page query and the
        // count query.
        let mut include_ids: Option<Vec<i32>> = None;
        let mut exclude_ids: Option<Vec<i32>> = None;
        if let Some(status) = params.status.as_deref() {
            let records = learning_records::table
                .filter(learning_records::user_id.eq(user_id))
                .select(learning_records::card_id);
            match status {
                // A card is new while it has no record or a record that has
                // never scored.
                "new" => {
                    exclude_ids = Some(
                        records
                            .filter(learning_records::mastery_level.ne(0))
                            .load(conn)?,
                    )
                }
                "learning" => {
                    include_ids = Some(
                        records
                            .filter(learning_records::mastery_level.ge(1))
                            .filter(learning_records::mastery_level.lt(40))
                            .load(conn)?,
                    )
                }
                "review" => {
                    include_ids = Some(
                        records
                            .filter(learning_records::mastery_level.ge(40))
                            .filter(learning_records::mastery_level.lt(80))
                            .load(conn)?,
                    )
                }
                "mastered" => {
                    include_ids = Some(
                        records
                            .filter(learning_records::mastery_level.ge(80))
                            .load(conn)?,
                    )
                }
                _ => {}
            }
        }

        let total: i64 = {
            let mut query = study_cards::table
                .filter(study_cards::user_id.eq(user_id))
                .select(diesel::dsl::count_star())
                .into_boxed();
            if let Some(subject) = &params.subject {
                query = query.filter(study_cards::subject.eq(subject.clone()));
            }
            if let Some(search) = &params.search {
                let pattern = format!("%{}%", search);
                query = query.filter(
                    study_cards::title
                        .like(pattern.clone())
                        .or(study_cards::core_point.like(pattern.clone()))
                        .or(study_cards::tags.assume_not_null().like(pattern)),
                );
            }
            if let Some(ids) = &include_ids {
                query = query.filter(study_cards::card_id.eq_any(ids.clone()));
            }
            if let Some(ids) = &exclude_ids {
                query = query.filter(study_cards::card_id.ne_all(ids.clone()));
            }
            query.first(conn)?
        };

        let cards = {
            let mut query = study_cards::table
                .filter(study_cards::user_id.eq(user_id))
                .select(StudyCard::as_select())
                .into_boxed();
            if let Some(subject) = &params.subject {
                query = query.filter(study_cards::subject.eq(subject.clone()));
            }
            if let Some(search) = &params.search {
                let pattern = format!("%{}%", search);
                query = query.filter(
                    study_cards::title
                        .like(pattern.clone())
                        .or(study_cards::core_point.like(pattern.clone()))
                        .or(study_cards::tags.assume_not_null().like(pattern)),
                );
            }
            if let Some(ids) = &include_ids {
                query = query.filter(study_cards::card_id.eq_any(ids.clone()));
            }
            if let Some(ids) = &exclude_ids {
                query = query.filter(study_cards::card_id.ne_all(ids.clone()));
            }
            query
                .order(study_cards::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?
        };

        Ok((cards, total))
    }

    /// Learning records for a set of cards, for joining list pages with
    /// per-card progress.
    pub fn records_for_cards(
        conn: &mut SqliteConnection,
        user_id: i32,
        card_ids: &[i32],
    ) -> Result<Vec<LearningRecord>, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::card_id.eq_any(card_ids.to_vec()))
            .select(LearningRecord::as_select())
            .load(conn)
    }

    /// Deletes a card together with its learning records and session log
    /// entries, as one transaction.
    pub fn delete_cascade(
        conn: &mut SqliteConnection,
        card_id: i32,
    ) -> Result<(), diesel::result::Error> {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(study_sessions::table.filter(study_sessions::card_id.eq(card_id)))
                .execute(conn)?;
            diesel::delete(learning_records::table.filter(learning_records::card_id.eq(card_id)))
                .execute(conn)?;
            diesel::delete(study_cards::table.filter(study_cards::card_id.eq(card_id)))
                .execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{CardListParams, NewStudySession};
    use crate::data::repositories::LearningRecordRepository;
    use crate::schema::users;
    use chrono::Utc;
    use diesel_migrations::MigrationHarness;

    fn test_conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(crate::MIGRATIONS).unwrap();
        conn
    }

    fn seed_user(conn: &mut SqliteConnection) -> i32 {
        diesel::insert_into(users::table)
            .values((
                users::email.eq("a@example.com"),
                users::username.eq("tester"),
                users::password.eq("hash"),
            ))
            .execute(conn)
            .unwrap();
        diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()"))
            .get_result(conn)
            .unwrap()
    }

    fn seed_card(conn: &mut SqliteConnection, user_id: i32, title: &str, subject: &str) -> i32 {
        let card = CardRepository::create(
            conn,
            &NewStudyCard {
                user_id,
                title,
                subject,
                core_point: "core",
                confusion_point: None,
                example: None,
                difficulty: "medium",
                tags: Some("basics,intro"),
                sketch_prompt: None,
                created_at: Utc::now().naive_utc(),
            },
        )
        .unwrap();
        card.card_id
    }

    fn params(status: Option<&str>, search: Option<&str>, subject: Option<&str>) -> CardListParams {
        CardListParams {
            page: None,
            limit: None,
            subject: subject.map(str::to_string),
            status: status.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    #[test]
    fn list_filters_by_subject_search_and_status() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn);
        let algebra = seed_card(&mut conn, user_id, "Algebra basics", "math");
        let geometry = seed_card(&mut conn, user_id, "Geometry proofs", "math");
        let _cells = seed_card(&mut conn, user_id, "Cell structure", "biology");

        let now = Utc::now().naive_utc();
        let record = LearningRecordRepository::create(&mut conn, user_id, algebra, now, now).unwrap();
        LearningRecordRepository::update_after_review(
            &mut conn,
            record.record_id,
            2,
            1,
            1,
            now,
            now,
            50,
        )
        .unwrap();

        let (cards, total) =
            CardRepository::list(&mut conn, user_id, &params(None, None, Some("math"))).unwrap();
        assert_eq!(total, 2);
        assert_eq!(cards.len(), 2);

        let (cards, total) =
            CardRepository::list(&mut conn, user_id, &params(None, Some("Geometry"), None))
                .unwrap();
        assert_eq!(total, 1);
        assert_eq!(cards[0].card_id, geometry);

        // Mastery 50 puts the reviewed card in the review bucket; the others
        // have no scored record yet
        let (cards, _) =
            CardRepository::list(&mut conn, user_id, &params(Some("review"), None, None)).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_id, algebra);

        let (cards, total) =
            CardRepository::list(&mut conn, user_id, &params(Some("new"), None, None)).unwrap();
        assert_eq!(total, 2);
        assert!(cards.iter().all(|card| card.card_id != algebra));
    }

    #[test]
    fn list_pages_are_bounded() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn);
        for i in 0..3 {
            seed_card(&mut conn, user_id, &format!("card {}", i), "math");
        }

        let mut page_params = params(None, None, None);
        page_params.limit = Some(2);
        page_params.page = Some(1);
        let (cards, total) = CardRepository::list(&mut conn, user_id, &page_params).unwrap();
        assert_eq!(total, 3);
        assert_eq!(cards.len(), 2);

        page_params.page = Some(2);
        let (cards, _) = CardRepository::list(&mut conn, user_id, &page_params).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn delete_cascade_removes_records_and_sessions() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn);
        let card_id = seed_card(&mut conn, user_id, "card", "math");
        let now = Utc::now().naive_utc();

        LearningRecordRepository::create(&mut conn, user_id, card_id, now, now).unwrap();
        LearningRecordRepository::append_session(
            &mut conn,
            &NewStudySession {
                user_id,
                card_id,
                difficulty: "normal",
                is_correct: true,
                time_spent: 5,
                session_date: now,
            },
        )
        .unwrap();

        CardRepository::delete_cascade(&mut conn, card_id).unwrap();

        assert!(CardRepository::find_for_user(&mut conn, card_id, user_id)
            .unwrap()
            .is_none());
        assert!(LearningRecordRepository::find(&mut conn, user_id, card_id)
            .unwrap()
            .is_none());
        let sessions: i64 = study_sessions::table.count().get_result(&mut conn).unwrap();
        assert_eq!(sessions, 0);
    }
}
