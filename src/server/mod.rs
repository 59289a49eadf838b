//! HTTP server: public pages, the feed, flat pages and the admin API

pub mod admin;
pub mod auth;
mod response;

use anyhow::{Context as _, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::SiteConfig;
use crate::content::MarkdownRenderer;
use crate::feed;
use crate::store::Store;
use crate::templates::{PostData, SiteData, TemplateRenderer};
use crate::views::{self, Filter, Listing};
use crate::Blog;

/// Everything a request handler needs
pub struct AppState {
    pub config: SiteConfig,
    pub store: Store,
    pub markdown: MarkdownRenderer,
    pub templates: TemplateRenderer,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: SiteConfig, store: Store) -> crate::Result<Self> {
        Ok(Self {
            markdown: MarkdownRenderer::with_options(&config.highlight),
            templates: TemplateRenderer::new()?,
            config,
            store,
        })
    }

    fn site(&self) -> SiteData {
        SiteData::new(&self.config, &self.store)
    }

    fn render_listing(
        &self,
        listing: crate::Result<Listing>,
        base_path: &str,
    ) -> crate::Result<String> {
        let listing = match listing {
            Ok(listing) => listing,
            Err(crate::Error::InvalidFilter(reason)) => {
                tracing::debug!("{}: {}", base_path, reason);
                Listing::empty()
            }
            Err(e) => return Err(e),
        };

        let posts: Vec<PostData> = listing
            .page
            .items
            .iter()
            .map(|post| PostData::new(post, &self.store, &self.markdown))
            .collect();
        self.templates
            .render_listing(&self.site(), &listing, &posts, base_path)
    }
}

/// Build the application router
pub fn router(state: SharedState, static_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/feeds/posts/", get(posts_feed))
        .route("/category/:slug/", get(category))
        .route("/tag/:slug/", get(tag))
        .route("/:year/:month/:slug/", get(post_detail))
        .nest("/admin", admin::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let store = blog.open_store()?;
    tracing::info!("Serving {} posts", store.post_count());

    let state = Arc::new(AppState::new(blog.config.clone(), store)?);
    let app = router(state, &blog.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port)
        .parse()
        .with_context(|| format!("Invalid address {}:{}", ip, port))?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

impl PageQuery {
    fn number(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

async fn index(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let listing = views::listing(
        &state.store,
        Filter::All,
        query.number(),
        state.config.per_page,
    );
    state.html("/", state.render_listing(listing, "/"))
}

async fn category(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let base_path = format!("/category/{}/", slug);
    let listing = Filter::category(&slug)
        .and_then(|f| views::listing(&state.store, f, query.number(), state.config.per_page));
    state.html(&base_path, state.render_listing(listing, &base_path))
}

async fn tag(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let base_path = format!("/tag/{}/", slug);
    let listing = Filter::tag(&slug)
        .and_then(|f| views::listing(&state.store, f, query.number(), state.config.per_page));
    state.html(&base_path, state.render_listing(listing, &base_path))
}

async fn post_detail(State(state): State<SharedState>, uri: Uri) -> Response {
    resolve(&state, uri.path())
}

async fn posts_feed(State(state): State<SharedState>) -> Response {
    let document = feed::generate_feed(&state.store, &state.config, None);
    ([(CONTENT_TYPE, feed::CONTENT_TYPE)], document.to_rss()).into_response()
}

async fn fallback(State(state): State<SharedState>, uri: Uri) -> Response {
    resolve(&state, uri.path())
}

/// Serve a post or a flat page at `path`, redirecting to the canonical form
fn resolve(state: &AppState, path: &str) -> Response {
    if let Ok(post) = views::get_post(&state.store, path) {
        let canonical = post.canonical_path(&state.store.tz());
        if canonical != path {
            return Redirect::permanent(&canonical).into_response();
        }
        let data = PostData::new(&post, &state.store, &state.markdown);
        return state.html(path, state.templates.render_post(&state.site(), &data));
    }

    let url = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    };
    if let Some(page) = state.store.flat_page(&url) {
        if url != path {
            return Redirect::permanent(&url).into_response();
        }
        return state.html(path, state.templates.render_flat_page(&state.site(), &page));
    }

    state.error_page(path, crate::Error::NotFound(path.to_string()))
}
