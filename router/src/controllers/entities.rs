//! Direct reads and trusted writes of one registered entity type.

use std::collections::BTreeMap;
use std::sync::Arc;

use entity::{Payload, Representation};
use tracing::debug;

use super::{gas_for, param_page, param_tags, param_uuid, to_json, AMOUNT, INDEX, TAG, TAGS, UUID};
use crate::error::Result;
use crate::response::{QueryResponse, TransactionResponse};
use crate::route::Route;

/// Routes for one representation, mounted at `/<keyname>`:
///
/// ```text
/// Save     /<keyname>                                   store directly
/// Delete   /<keyname>/<id>
/// Retrieve /<keyname>                                   first page of all
/// Retrieve /<keyname>/<id>
/// Retrieve /<keyname>/intersect/<a,b,..>                exactly one match
/// Retrieve /<keyname>/set/<tag>[/<index>/<amount>]
/// Retrieve /<keyname>/set/intersect/<a,b,..>[/<index>/<amount>]
/// ```
///
/// A save grants the writing role access to the new element's path so the
/// same role can delete it later; the delete revokes it again.
#[derive(Clone)]
pub struct EntityControllers {
    representation: Arc<dyn Representation>,
    prefix: String,
    default_page_size: i64,
    gas_price_per_kb: i64,
}

impl EntityControllers {
    pub fn new(representation: Arc<dyn Representation>, default_page_size: i64, gas_price_per_kb: i64) -> Self {
        let prefix = format!("/{}", representation.meta_data().keyname());
        Self {
            representation,
            prefix,
            default_page_size,
            gas_price_per_kb,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn routes(&self) -> Result<Vec<Route>> {
        let prefix = &self.prefix;
        let element = format!("{}/<id|{}>", prefix, UUID);
        let intersect = format!("{}/intersect/<keynames|{}>", prefix, TAGS);
        let set = format!("{}/set/<keyname|{}>", prefix, TAG);
        let set_intersect = format!("{}/set/intersect/<keynames|{}>", prefix, TAGS);
        let page = format!("/<index|{}>/<amount|{}>", INDEX, AMOUNT);

        Ok(vec![
            self.save(prefix)?,
            self.delete(&element)?,
            self.list(prefix)?,
            self.by_id(&element)?,
            self.by_intersect(&intersect)?,
            self.set_by_intersect(&format!("{}{}", set_intersect, page))?,
            self.set_by_intersect(&set_intersect)?,
            self.set_by_keyname(&format!("{}{}", set, page))?,
            self.set_by_keyname(&set)?,
        ])
    }

    fn save(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        let price = self.gas_price_per_kb;
        Route::save(pattern, move |ctx, data| {
            let meta = representation.meta_data();
            let ins = meta.to_entity(&ctx.repository(), Payload::Wire(data))?;
            ctx.service().save(ins.as_ref(), representation.as_ref())?;

            let element = format!("{}/{}", ctx.path, ins.id());
            ctx.store
                .enable_write_access(ctx.role_key, [regex::escape(&element)]);
            debug!(path = %element, role = ctx.role_key, "Granted element write access");

            let body = to_json(&meta.normalize(ins.as_ref())?)?;
            let gas = gas_for(body.len(), price);
            let mut tags = BTreeMap::new();
            tags.insert(element.clone(), body);
            Ok(TransactionResponse::success(
                format!("saved {} {}", meta.name(), ins.id()),
                gas,
                tags,
            ))
        })
    }

    fn delete(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        Route::delete(pattern, move |ctx| {
            let meta = representation.meta_data();
            let id = param_uuid(ctx.params, "id")?;
            let ins = ctx.repository().retrieve_by_id(meta, id)?;
            ctx.service().delete(ins.as_ref(), representation.as_ref())?;
            ctx.store
                .disable_write_access(ctx.role_key, [regex::escape(ctx.path)]);

            let mut tags = BTreeMap::new();
            tags.insert(ctx.path.to_string(), Vec::new());
            Ok(TransactionResponse::success(
                format!("deleted {} {}", meta.name(), id),
                0,
                tags,
            ))
        })
    }

    fn list(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        let page_size = self.default_page_size;
        Route::query(pattern, move |ctx| {
            let meta = representation.meta_data();
            let page = ctx
                .repository()
                .retrieve_set_by_keyname(meta, meta.keyname(), 0, page_size)?;
            Ok(QueryResponse::success(ctx.path, to_json(&page.normalize(meta)?)?))
        })
    }

    fn by_id(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        Route::query(pattern, move |ctx| {
            let meta = representation.meta_data();
            let id = param_uuid(ctx.params, "id")?;
            let ins = ctx.repository().retrieve_by_id(meta, id)?;
            Ok(QueryResponse::success(ctx.path, to_json(&meta.normalize(ins.as_ref())?)?))
        })
    }

    fn by_intersect(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        Route::query(pattern, move |ctx| {
            let meta = representation.meta_data();
            let tags = param_tags(ctx.params)?;
            let ins = ctx.repository().retrieve_by_intersect_keynames(meta, &tags)?;
            Ok(QueryResponse::success(ctx.path, to_json(&meta.normalize(ins.as_ref())?)?))
        })
    }

    fn set_by_keyname(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        let page_size = self.default_page_size;
        Route::query(pattern, move |ctx| {
            let meta = representation.meta_data();
            let (index, amount) = param_page(ctx.params, page_size)?;
            let keyname = ctx.params.get("keyname").map(String::as_str).unwrap_or_default();
            let page = ctx
                .repository()
                .retrieve_set_by_keyname(meta, keyname, index, amount)?;
            Ok(QueryResponse::success(ctx.path, to_json(&page.normalize(meta)?)?))
        })
    }

    fn set_by_intersect(&self, pattern: &str) -> Result<Route> {
        let representation = self.representation.clone();
        let page_size = self.default_page_size;
        Route::query(pattern, move |ctx| {
            let meta = representation.meta_data();
            let (index, amount) = param_page(ctx.params, page_size)?;
            let tags = param_tags(ctx.params)?;
            let page = ctx
                .repository()
                .retrieve_set_by_intersect_keynames(meta, &tags, index, amount)?;
            Ok(QueryResponse::success(ctx.path, to_json(&page.normalize(meta)?)?))
        })
    }
}
