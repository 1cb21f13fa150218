//! The conversion driver
//!
//! Walks the document top-down (document → paths → operations), deriving an
//! effective scope context at each level and emitting services, upstreams,
//! and routes. Paths and methods are visited in ascending order, so the
//! output is byte-stable for a given input and UUID namespace.

use crate::extensions;
use crate::plugins::{insert_plugin, plugins_list};
use crate::routes::create_route;
use crate::service::create_service;
use crate::slug::slugify;
use crate::validator::{generate_validator, take_validator};
use crate::Oas2KongOptions;
use openapi2kong_common::{JsonObject, Result};
use openapi2kong_parser::{OasDocument, Operation, PathItem, Server};
use serde_json::Value;
use uuid::Uuid;

const FORMAT_VERSION_KEY: &str = "_format_version";
const FORMAT_VERSION_VALUE: &str = "3.0";

/// Effective configuration for one scope (document, path, or operation).
///
/// A deeper scope starts from a clone of its parent and replaces fields
/// pointwise; ancestors are never mutated.
#[derive(Clone)]
struct ScopeContext<'a> {
    base_name: String,
    servers: &'a [Server],
    service_defaults: Option<JsonObject>,
    upstream_defaults: Option<JsonObject>,
    route_defaults: Option<JsonObject>,
    /// Plugin list of this scope, sorted by plugin name
    plugins: Vec<JsonObject>,
    /// Innermost `request-validator` config seen so far
    validator: Option<JsonObject>,
    /// Index of the scope's service in the output list
    service: usize,
    /// Whether this scope created its own service entity
    created_service: bool,
}

/// Walks an OAS document and assembles the Kong declarative output.
pub(crate) struct Converter<'a> {
    doc: &'a OasDocument,
    components: JsonObject,
    tags: Vec<String>,
    uuid_namespace: Uuid,
    services: Vec<JsonObject>,
    upstreams: Vec<JsonObject>,
}

impl<'a> Converter<'a> {
    pub fn run(doc: &'a OasDocument, options: &Oas2KongOptions) -> Result<JsonObject> {
        let components = extensions::x_kong_components(doc)?;
        let tags = extensions::kong_tags(doc, options.tags.as_deref())?;

        let mut converter = Converter {
            doc,
            components,
            tags,
            uuid_namespace: options.uuid_namespace,
            services: Vec::new(),
            upstreams: Vec::new(),
        };

        let doc_ctx = converter
            .convert_document(options.doc_name.as_deref())
            .map_err(|e| e.context("document root"))?;

        for (path, item) in &doc.paths {
            let path_ctx = converter
                .convert_path(&doc_ctx, path, item)
                .map_err(|e| e.context(&format!("path '{path}'")))?;

            for (method, operation) in item.operations() {
                converter
                    .convert_operation(&doc_ctx, &path_ctx, path, item, method, operation)
                    .map_err(|e| e.context(&format!("operation '{method} {path}'")))?;
            }
        }

        let mut result = JsonObject::new();
        result.insert(
            FORMAT_VERSION_KEY.to_string(),
            Value::String(FORMAT_VERSION_VALUE.to_string()),
        );
        result.insert(
            "services".to_string(),
            Value::Array(converter.services.into_iter().map(Value::Object).collect()),
        );
        result.insert(
            "upstreams".to_string(),
            Value::Array(converter.upstreams.into_iter().map(Value::Object).collect()),
        );
        Ok(result)
    }

    /// Document scope: name precedence is explicit option, `x-kong-name`,
    /// then `info.title`.
    fn convert_document(&mut self, doc_name: Option<&str>) -> Result<ScopeContext<'a>> {
        let raw_name = match doc_name {
            Some(name) => name.to_string(),
            None => match extensions::kong_name(&self.doc.extensions)? {
                Some(name) => name,
                None => self.doc.info.title.clone(),
            },
        };
        let base_name = slugify(&[&raw_name]);

        let service_defaults =
            extensions::service_defaults(&self.doc.extensions, &self.components)?;
        let upstream_defaults =
            extensions::upstream_defaults(&self.doc.extensions, &self.components)?;
        let route_defaults = extensions::route_defaults(&self.doc.extensions, &self.components)?;

        let (service, upstream) = create_service(
            &base_name,
            &self.doc.servers,
            service_defaults.as_ref(),
            upstream_defaults.as_ref(),
            &self.tags,
            &self.uuid_namespace,
        )?;
        let service_index = self.services.len();
        self.services.push(service);
        if let Some(upstream) = upstream {
            self.upstreams.push(upstream);
        }

        let mut plugins = plugins_list(
            &self.doc.extensions,
            None,
            &self.uuid_namespace,
            &base_name,
            &self.components,
            &self.tags,
        )?;
        let validator = take_validator(&mut plugins, None);
        self.attach_plugins(service_index, &plugins);

        Ok(ScopeContext {
            base_name,
            servers: &self.doc.servers,
            service_defaults,
            upstream_defaults,
            route_defaults,
            plugins,
            validator,
            service: service_index,
            created_service: true,
        })
    }

    /// Path scope: name precedence is `x-kong-name`, then the literal path.
    fn convert_path(
        &mut self,
        parent: &ScopeContext<'a>,
        path: &str,
        item: &'a PathItem,
    ) -> Result<ScopeContext<'a>> {
        let mut ctx = parent.clone();
        ctx.created_service = false;

        let segment = match extensions::kong_name(&item.extensions)? {
            Some(name) => name,
            None => path.to_string(),
        };
        ctx.base_name = format!("{}_{}", parent.base_name, slugify(&[&segment]));

        let mut need_new_service = false;
        let mut need_new_upstream = false;

        if let Some(defaults) = extensions::service_defaults(&item.extensions, &self.components)? {
            ctx.service_defaults = Some(defaults);
            need_new_service = true;
        }
        if let Some(defaults) = extensions::upstream_defaults(&item.extensions, &self.components)? {
            ctx.upstream_defaults = Some(defaults);
            need_new_upstream = true;
            need_new_service = true;
        }
        if let Some(defaults) = extensions::route_defaults(&item.extensions, &self.components)? {
            ctx.route_defaults = Some(defaults);
        }
        if !item.servers.is_empty() {
            ctx.servers = &item.servers;
            need_new_upstream = true;
            need_new_service = true;
        }

        if need_new_service {
            self.new_scope_service(&mut ctx, parent.service, need_new_upstream)?;

            // a fresh service entity carries the document plugins too
            let mut plugins = plugins_list(
                &item.extensions,
                Some(parent.plugins.as_slice()),
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?;
            ctx.validator = take_validator(&mut plugins, parent.validator.as_ref());
            self.attach_plugins(ctx.service, &plugins);
            ctx.plugins = plugins;
        } else {
            // stick to the parent service entity; only the local plugins
            // matter, the routes below will merge them
            let mut plugins = plugins_list(
                &item.extensions,
                None,
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?;
            ctx.validator = take_validator(&mut plugins, parent.validator.as_ref());
            ctx.plugins = plugins;
        }

        Ok(ctx)
    }

    /// Operation scope: name precedence is `x-kong-name` (under the path
    /// base), then `operationId` (under the document base), then the
    /// method (under the path base).
    #[allow(clippy::too_many_arguments)]
    fn convert_operation(
        &mut self,
        doc_ctx: &ScopeContext<'a>,
        path_ctx: &ScopeContext<'a>,
        path: &str,
        item: &'a PathItem,
        method: &'static str,
        operation: &'a Operation,
    ) -> Result<()> {
        let mut ctx = path_ctx.clone();
        ctx.created_service = false;

        ctx.base_name = match extensions::kong_name(&operation.extensions)? {
            Some(name) => format!("{}_{}", path_ctx.base_name, slugify(&[&name])),
            None => match &operation.operation_id {
                Some(operation_id) => {
                    format!("{}_{}", doc_ctx.base_name, slugify(&[operation_id]))
                }
                None => format!("{}_{}", path_ctx.base_name, slugify(&[method])),
            },
        };

        let mut need_new_service = false;
        let mut need_new_upstream = false;

        if let Some(defaults) =
            extensions::service_defaults(&operation.extensions, &self.components)?
        {
            ctx.service_defaults = Some(defaults);
            need_new_service = true;
        }
        if let Some(defaults) =
            extensions::upstream_defaults(&operation.extensions, &self.components)?
        {
            ctx.upstream_defaults = Some(defaults);
            need_new_upstream = true;
            need_new_service = true;
        }
        if let Some(defaults) = extensions::route_defaults(&operation.extensions, &self.components)?
        {
            ctx.route_defaults = Some(defaults);
        }
        if !operation.servers.is_empty() {
            ctx.servers = &operation.servers;
            need_new_upstream = true;
            need_new_service = true;
        }

        if need_new_service {
            self.new_scope_service(&mut ctx, path_ctx.service, need_new_upstream)?;
        }

        let mut plugins = if ctx.created_service {
            // fresh operation service: nothing persisted to inherit from,
            // so re-walk document and path extensions under this base name
            let doc_plugins = plugins_list(
                &self.doc.extensions,
                None,
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?;
            let path_plugins = plugins_list(
                &item.extensions,
                Some(doc_plugins.as_slice()),
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?;
            plugins_list(
                &operation.extensions,
                Some(path_plugins.as_slice()),
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?
        } else if path_ctx.created_service {
            // the path service already carries document and path plugins
            plugins_list(
                &operation.extensions,
                None,
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?
        } else {
            // document-level service entity: the route needs the path and
            // operation plugins
            plugins_list(
                &operation.extensions,
                Some(path_ctx.plugins.as_slice()),
                &self.uuid_namespace,
                &ctx.base_name,
                &self.components,
                &self.tags,
            )?
        };

        let validator_source = take_validator(&mut plugins, path_ctx.validator.as_ref());
        if let Some(plugin) = generate_validator(
            validator_source.as_ref(),
            self.doc,
            operation,
            &self.uuid_namespace,
            &ctx.base_name,
        )? {
            insert_plugin(&mut plugins, plugin);
        }

        let route = create_route(
            &ctx.base_name,
            path,
            method,
            ctx.route_defaults.as_ref(),
            plugins,
            &self.tags,
            &self.uuid_namespace,
        );
        self.append_route(ctx.service, route);

        Ok(())
    }

    /// Create a service for a deeper scope and decide what happens to the
    /// upstream the factory may have built alongside it: keep it when the
    /// scope really changed the upstream, otherwise drop it and point the
    /// new service at the parent service's host.
    fn new_scope_service(
        &mut self,
        ctx: &mut ScopeContext<'a>,
        parent_service: usize,
        need_new_upstream: bool,
    ) -> Result<()> {
        let (service, upstream) = create_service(
            &ctx.base_name,
            ctx.servers,
            ctx.service_defaults.as_ref(),
            ctx.upstream_defaults.as_ref(),
            &self.tags,
            &self.uuid_namespace,
        )?;

        ctx.service = self.services.len();
        ctx.created_service = true;
        self.services.push(service);

        if let Some(upstream) = upstream {
            if need_new_upstream {
                self.upstreams.push(upstream);
            } else if let Some(host) = self.services[parent_service].get("host").cloned() {
                self.services[ctx.service].insert("host".to_string(), host);
            }
        }

        Ok(())
    }

    fn attach_plugins(&mut self, service: usize, plugins: &[JsonObject]) {
        self.services[service].insert(
            "plugins".to_string(),
            Value::Array(plugins.iter().cloned().map(Value::Object).collect()),
        );
    }

    fn append_route(&mut self, service: usize, route: JsonObject) {
        if let Some(Value::Array(routes)) = self.services[service].get_mut("routes") {
            routes.push(Value::Object(route));
        }
    }
}
