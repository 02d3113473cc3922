use tracing::debug;

use forkful_db::queries::{follows, recipes, users};
use forkful_types::models::{AuthInfo, FeedItem, Page, UserId};

use crate::Forkful;
use crate::error::{Entity, Result, ServiceError};
use crate::guard;
use crate::pagination::{FEED_ORDER, PageRequest};

impl Forkful {
    /// Toggle the follow edge from the caller to `target`. Returns whether the
    /// caller follows `target` afterwards; calling twice restores the original state.
    pub fn follow(&self, auth: Option<AuthInfo>, target: UserId) -> Result<bool> {
        let (caller, following) = self.db.transaction(|tx| -> Result<_> {
            let caller = guard::require_active_user(tx, auth)?;
            if caller == target {
                return Err(ServiceError::SelfFollowRejected);
            }
            guard::require_user(tx, target)?;

            if follows::exists(tx, caller, target)? {
                follows::delete(tx, caller, target)?;
                Ok((caller, false))
            } else {
                follows::insert(tx, caller, target)?;
                Ok((caller, true))
            }
        })?;

        debug!("User {} follows {}: {}", caller, target, following);
        Ok(following)
    }

    /// Recipes by accounts the caller follows, newest first.
    pub fn feed(
        &self,
        auth: Option<AuthInfo>,
        page: i64,
        size: i64,
        category: Option<&str>,
    ) -> Result<Page<FeedItem>> {
        let request = PageRequest::new(page, size)?;
        self.db.read(|conn| -> Result<_> {
            let caller = guard::require_active_user(conn, auth)?;
            let page = request.fetch(
                || recipes::feed_count(conn, caller, category),
                |limit, offset| {
                    recipes::feed_page(conn, caller, category, FEED_ORDER, limit, offset)
                },
            )?;
            Ok(page.map(FeedItem::from))
        })
    }

    /// Ids following `user`, ascending.
    pub fn followers(&self, user: UserId) -> Result<Vec<UserId>> {
        self.follow_list(user, follows::followers)
    }

    /// Ids `user` follows, ascending.
    pub fn following(&self, user: UserId) -> Result<Vec<UserId>> {
        self.follow_list(user, follows::following)
    }

    fn follow_list(
        &self,
        user: UserId,
        list: fn(&rusqlite::Connection, UserId) -> anyhow::Result<Vec<UserId>>,
    ) -> Result<Vec<UserId>> {
        self.db.read(|conn| -> Result<_> {
            guard::require_exists(users::deleted_flag(conn, user)?, Entity::User, user)?;
            Ok(list(conn, user)?)
        })
    }
}
