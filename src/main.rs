use std::{process, sync::Arc};

use inklet::{
    application::{error::StoreError, store::PostStore},
    config::{self, Command, CommentArgs, CreateArgs, DeleteArgs, FetchArgs, UpdateArgs},
    domain::posts::{Post, PostDraft, PostId, derive_excerpt, placeholder_image},
    infra::{error::InfraError, http::HttpBlogApi, notify::TracingNotifier, telemetry},
};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum RunError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &RunError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), RunError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let api = Arc::new(HttpBlogApi::new(&settings.api)?);
    let notifier = Arc::new(TracingNotifier);
    let mut store = PostStore::new(api, notifier);

    let command = cli_args
        .command
        .unwrap_or(Command::Fetch(FetchArgs::default()));

    match command {
        Command::Fetch(_) => run_fetch(&mut store).await,
        Command::Create(args) => run_create(&mut store, args).await,
        Command::Update(args) => run_update(&mut store, args).await,
        Command::Delete(args) => run_delete(&mut store, args).await,
        Command::Comment(args) => run_comment(&mut store, args).await,
    }
}

async fn run_fetch(store: &mut PostStore) -> Result<(), RunError> {
    store.fetch_posts().await?;
    print_posts(store.posts());
    Ok(())
}

async fn run_create(store: &mut PostStore, args: CreateArgs) -> Result<(), RunError> {
    let content = format!("<p>{}</p>", args.content);
    let draft = PostDraft {
        excerpt: args
            .excerpt
            .unwrap_or_else(|| derive_excerpt(&args.content)),
        image: args
            .image
            .unwrap_or_else(|| placeholder_image(&PostId::new("local"))),
        title: args.title,
        content,
        category: args.category,
        author: args.author,
        created_at: OffsetDateTime::now_utc(),
    };

    let post = store.create_post(draft).await?;
    info!(id = %post.id, title = %post.title, "created post");
    Ok(())
}

async fn run_update(store: &mut PostStore, args: UpdateArgs) -> Result<(), RunError> {
    store.fetch_posts().await?;

    let id = PostId::new(args.id);
    let Some(existing) = store.posts().iter().find(|post| post.id == id) else {
        warn!(id = %id, "no post with this id in the collection");
        return Ok(());
    };

    let mut post = existing.clone();
    post.title = args.title;
    post.content = format!("<p>{}</p>", args.content);
    post.excerpt = derive_excerpt(&args.content);

    store.update_post(post).await?;
    info!(id = %id, "updated post");
    Ok(())
}

async fn run_delete(store: &mut PostStore, args: DeleteArgs) -> Result<(), RunError> {
    store.fetch_posts().await?;

    let id = PostId::new(args.id);
    store.delete_post(&id).await?;
    info!(id = %id, "deleted post");
    Ok(())
}

async fn run_comment(store: &mut PostStore, args: CommentArgs) -> Result<(), RunError> {
    store.fetch_posts().await?;

    let id = PostId::new(args.id);
    let comment = store.add_comment(&id, args.author, args.content);
    info!(id = %id, comment = %comment.id, "added comment");
    Ok(())
}

fn print_posts(posts: &[Post]) {
    for post in posts {
        println!(
            "{:>6}  {:<60}  by {:<24}  {} comment(s)",
            post.id,
            post.title,
            post.author,
            post.comments.len()
        );
    }
    println!("{} post(s)", posts.len());
}
