use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                gender      TEXT NOT NULL DEFAULT 'Unknown',
                age         INTEGER NOT NULL,
                role        TEXT NOT NULL DEFAULT 'USER',
                is_deleted  INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE recipes (
                id                  INTEGER PRIMARY KEY,
                author_id           INTEGER NOT NULL REFERENCES users(id),
                name                TEXT NOT NULL,
                description         TEXT,
                category            TEXT,
                cook_time_iso       TEXT,
                cook_time_sec       INTEGER NOT NULL DEFAULT 0,
                prep_time_iso       TEXT,
                prep_time_sec       INTEGER NOT NULL DEFAULT 0,
                date_published      TEXT NOT NULL,
                aggregated_rating   REAL,
                review_count        INTEGER NOT NULL DEFAULT 0,
                calories            REAL,
                fat                 REAL,
                saturated_fat       REAL,
                cholesterol         REAL,
                sodium              REAL,
                carbohydrate        REAL,
                fiber               REAL,
                sugar               REAL,
                protein             REAL,
                servings            INTEGER,
                yield               TEXT,
                is_deleted          INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_recipes_category_rating
                ON recipes(category, aggregated_rating DESC);
            CREATE INDEX idx_recipes_calories ON recipes(calories);
            CREATE INDEX idx_recipes_author_published
                ON recipes(author_id, date_published DESC);

            CREATE TABLE recipe_ingredients (
                recipe_id   INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                position    INTEGER NOT NULL CHECK (position >= 0),
                name        TEXT NOT NULL,
                PRIMARY KEY (recipe_id, position)
            );

            CREATE TABLE reviews (
                id              INTEGER PRIMARY KEY,
                recipe_id       INTEGER NOT NULL REFERENCES recipes(id),
                author_id       INTEGER NOT NULL REFERENCES users(id),
                rating          INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                content         TEXT NOT NULL DEFAULT '',
                date_submitted  TEXT NOT NULL,
                date_modified   TEXT NOT NULL
            );

            CREATE INDEX idx_reviews_recipe ON reviews(recipe_id);

            CREATE TABLE review_likes (
                review_id   INTEGER NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (review_id, user_id)
            );

            CREATE TABLE user_follows (
                follower_id INTEGER NOT NULL REFERENCES users(id),
                followee_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (follower_id, followee_id),
                CHECK (follower_id <> followee_id)
            );

            CREATE INDEX idx_user_follows_followee ON user_follows(followee_id);

            CREATE TABLE id_sequences (
                entity  TEXT PRIMARY KEY,
                last_id INTEGER NOT NULL
            );

            INSERT INTO id_sequences (entity, last_id)
                VALUES ('users', 0), ('recipes', 0), ('reviews', 0);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (self-like trigger)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TRIGGER review_likes_no_self_like
                BEFORE INSERT ON review_likes
                WHEN NEW.user_id = (SELECT author_id FROM reviews WHERE id = NEW.review_id)
            BEGIN
                SELECT RAISE(ABORT, 'users cannot like their own review');
            END;

            INSERT INTO schema_version (version) VALUES (2);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
