use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

use shelfio::store::{BookWithDetails, NewBook, Status, Store};
use shelfio::{library, logging, openlibrary, remote, stats, Config};

struct Cli {
    config_path: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            // Global flags only count before the command; after it they
            // belong to the command (e.g. a comment that happens to be "-h").
            "--help" | "-h" if command.is_empty() => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" if command.is_empty() => {
                println!("shelfio {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" if command.is_empty() => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => command.push(args[i].clone()),
        }
        i += 1;
    }

    Cli {
        config_path,
        command,
    }
}

fn print_help() {
    println!(
        r#"shelfio - personal book tracking

USAGE:
    shelfio [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    list                    List books (--status S, --category NAME)
    show <BOOK_ID>          Show one book with author, category and review
    add <TITLE>             Add a book (--author "First Last", --category NAME,
                            --status S, --pages N, --isbn I, --publisher P)
    rm <BOOK_ID>            Remove a book and its review
    search <QUERY>          Search Open Library (at least 3 characters)
    import <QUERY>          Add the best search match
                            (--pick N, --category NAME, --status S)
    review <BOOK_ID> <RATING> [COMMENT]
                            Rate a book, 0 to 5 in half-star steps
    stats                   Show library statistics
    pull                    Import new books from the shelf service

Status values: not-started, reading, finished

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SHELFIO_LOG         Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/shelfio/config.toml"#
    );
}

fn main() -> Result<()> {
    let cli = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let config = match &cli.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Open the store and make sure the seed data is in place
    let store = Store::open(&config.db_path)?;
    store.initialize()?;

    let command: Vec<&str> = cli.command.iter().map(String::as_str).collect();
    match command.split_first() {
        Some((&"list", rest)) => cmd_list(&store, rest),
        Some((&"show", rest)) => cmd_show(&store, rest),
        Some((&"add", rest)) => cmd_add(&store, rest),
        Some((&"rm", rest)) => cmd_rm(&store, rest),
        Some((&"search", rest)) => cmd_search(&config, rest),
        Some((&"import", rest)) => cmd_import(&store, &config, rest),
        Some((&"review", rest)) => cmd_review(&store, rest),
        Some((&"stats", _)) => cmd_stats(&store),
        Some((&"pull", _)) => cmd_pull(&store, &config),
        Some((other, _)) => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
        None => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// Value following a `--flag`, or an error naming the flag.
fn flag_value<'a>(args: &[&'a str], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .copied()
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn parse_status(value: &str) -> Result<Status> {
    Status::from_str(value).ok_or_else(|| {
        anyhow!(
            "unknown status {:?} (use: not-started, reading, finished)",
            value
        )
    })
}

fn print_book_line(details: &BookWithDetails) {
    println!(
        "{}  {} by {} [{}]",
        details.book.book_id,
        details.book.title,
        details.author_name(),
        details.reading_status.status.as_str()
    );
}

fn cmd_list(store: &Store, args: &[&str]) -> Result<()> {
    let mut status = None;
    let mut category = None;

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "--status" => {
                status = Some(parse_status(flag_value(args, i, "--status")?)?);
                i += 1;
            }
            "--category" => {
                category = Some(flag_value(args, i, "--category")?.to_string());
                i += 1;
            }
            other => bail!("unexpected argument: {}", other),
        }
        i += 1;
    }

    let books = match (status, category.as_deref()) {
        (Some(status), None) => library::books_with_status(store, status),
        (None, Some(name)) => library::books_in_category(store, name),
        (Some(status), Some(name)) => library::books_in_category(store, name)
            .into_iter()
            .filter(|b| b.reading_status.status == status)
            .collect(),
        (None, None) => library::hydrate_all(store),
    };

    if books.is_empty() {
        println!("No books.");
        return Ok(());
    }
    for details in &books {
        print_book_line(details);
    }
    Ok(())
}

fn cmd_show(store: &Store, args: &[&str]) -> Result<()> {
    let book_id = match args.first() {
        Some(id) => *id,
        None => bail!("usage: shelfio show <BOOK_ID>"),
    };
    let details = match library::hydrate(store, book_id) {
        Some(details) => details,
        None => bail!("no book with id {}", book_id),
    };

    println!("Title:       {}", details.book.title);
    println!("Author:      {}", details.author_name());
    println!("Category:    {}", details.category.name);
    println!("Status:      {}", details.reading_status.status.as_str());
    if details.book.pages > 0 {
        println!("Pages:       {}", details.book.pages);
    }
    if !details.book.publisher.is_empty() {
        println!("Publisher:   {}", details.book.publisher);
    }
    if !details.book.isbn.is_empty() {
        println!("ISBN:        {}", details.book.isbn);
    }
    if !details.book.bookcover.is_empty() {
        println!("Cover:       {}", details.book.bookcover);
    }
    if let Some(review) = &details.review {
        println!("Rating:      {}", review.rating);
        if !review.comment.is_empty() {
            println!("Review:      {}", review.comment);
        }
    }
    if !details.collections.is_empty() {
        let names: Vec<&str> = details
            .collections
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        println!("Collections: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_add(store: &Store, args: &[&str]) -> Result<()> {
    let mut title = String::new();
    let mut author = String::new();
    let mut category = String::new();
    let mut status = Status::NotStarted;
    let mut publisher = String::new();
    let mut isbn = String::new();
    let mut pages = 0u32;

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "--author" => {
                author = flag_value(args, i, "--author")?.to_string();
                i += 1;
            }
            "--category" => {
                category = flag_value(args, i, "--category")?.to_string();
                i += 1;
            }
            "--status" => {
                status = parse_status(flag_value(args, i, "--status")?)?;
                i += 1;
            }
            "--publisher" => {
                publisher = flag_value(args, i, "--publisher")?.to_string();
                i += 1;
            }
            "--isbn" => {
                isbn = flag_value(args, i, "--isbn")?.to_string();
                i += 1;
            }
            "--pages" => {
                pages = flag_value(args, i, "--pages")?
                    .parse()
                    .map_err(|_| anyhow!("--pages requires a number"))?;
                i += 1;
            }
            other if title.is_empty() && !other.starts_with('-') => {
                title = other.to_string();
            }
            other => bail!("unexpected argument: {}", other),
        }
        i += 1;
    }
    if title.is_empty() {
        bail!("usage: shelfio add <TITLE> [--author \"First Last\"] [--category NAME] ...");
    }

    if author.trim().is_empty() {
        author = "Unknown Author".to_string();
    }
    let (author_first_name, author_last_name) = openlibrary::split_author_name(&author);
    let category_id = if category.trim().is_empty() {
        String::new()
    } else {
        store.find_or_create_category(&category).category_id
    };

    let book = store.add_book(NewBook {
        title,
        author_first_name,
        author_last_name,
        category_id,
        reading_status_id: status.id().to_string(),
        publisher,
        isbn,
        pages,
        bookcover: String::new(),
        collection_ids: Vec::new(),
    });
    println!("Added {} ({})", book.title, book.book_id);
    Ok(())
}

fn cmd_rm(store: &Store, args: &[&str]) -> Result<()> {
    let book_id = match args.first() {
        Some(id) => *id,
        None => bail!("usage: shelfio rm <BOOK_ID>"),
    };
    match store.get_book(book_id) {
        Some(book) => {
            store.delete_book(book_id);
            println!("Removed {}", book.title);
        }
        None => println!("No book with id {}", book_id),
    }
    Ok(())
}

fn cmd_search(config: &Config, args: &[&str]) -> Result<()> {
    let query = args.join(" ");
    let query = query.trim();
    if query.chars().count() < openlibrary::MIN_QUERY_LEN {
        bail!(
            "search needs at least {} characters",
            openlibrary::MIN_QUERY_LEN
        );
    }

    let client = openlibrary::Client::new(&config.open_library);
    let results = client.search(query);
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (index, result) in results.iter().enumerate() {
        let author = result
            .author_name
            .first()
            .map(String::as_str)
            .unwrap_or("Unknown Author");
        let year = result
            .first_publish_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:2}. {} by {} ({})", index + 1, result.title, author, year);
    }
    Ok(())
}

fn cmd_import(store: &Store, config: &Config, args: &[&str]) -> Result<()> {
    let mut pick = 1usize;
    let mut category = String::new();
    let mut status = None;
    let mut words = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "--pick" => {
                pick = flag_value(args, i, "--pick")?
                    .parse()
                    .map_err(|_| anyhow!("--pick requires a number"))?;
                i += 1;
            }
            "--category" => {
                category = flag_value(args, i, "--category")?.to_string();
                i += 1;
            }
            "--status" => {
                status = Some(parse_status(flag_value(args, i, "--status")?)?);
                i += 1;
            }
            word => words.push(word),
        }
        i += 1;
    }

    let query = words.join(" ");
    let query = query.trim();
    if query.chars().count() < openlibrary::MIN_QUERY_LEN {
        bail!(
            "import needs a query of at least {} characters",
            openlibrary::MIN_QUERY_LEN
        );
    }

    let client = openlibrary::Client::new(&config.open_library);
    let results = client.search(query);
    let result = match results.get(pick.saturating_sub(1)) {
        Some(result) => result,
        None => bail!("no result #{} for {:?}", pick, query),
    };

    let mut new_book = client.normalize(result);
    if !category.trim().is_empty() {
        new_book.category_id = store.find_or_create_category(&category).category_id;
    }
    if let Some(status) = status {
        new_book.reading_status_id = status.id().to_string();
    }

    let book = store.add_book(new_book);
    println!("Added {} ({})", book.title, book.book_id);
    Ok(())
}

fn cmd_review(store: &Store, args: &[&str]) -> Result<()> {
    if args.len() < 2 {
        bail!("usage: shelfio review <BOOK_ID> <RATING> [COMMENT]");
    }
    let book_id = args[0];
    let rating = parse_rating(args[1])?;
    let comment = args[2..].join(" ");

    if store.get_book(book_id).is_none() {
        bail!("no book with id {}", book_id);
    }

    store.upsert_review(book_id, rating, &comment);
    println!("Saved review for {}", book_id);
    Ok(())
}

/// Ratings go from 0 to 5 in half-star steps.
fn parse_rating(s: &str) -> Result<f32> {
    let rating: f32 = s.parse().map_err(|_| anyhow!("rating must be a number"))?;
    if !(0.0..=5.0).contains(&rating) || (rating * 2.0).fract() != 0.0 {
        bail!("rating must be between 0 and 5 in steps of 0.5");
    }
    Ok(rating)
}

fn cmd_stats(store: &Store) -> Result<()> {
    let books = library::hydrate_all(store);
    let reviews = store.get_reviews();
    let totals = stats::compute_stats(&books, &reviews);

    println!("Total Books:  {}", totals.total_books);
    println!("Finished:     {}", totals.finished_books);
    println!("Reading:      {}", totals.currently_reading);
    println!("Pages Read:   {}", totals.total_pages_read);
    if totals.reviews_count > 0 {
        println!("Avg Rating:   {}", totals.average_rating);
    } else {
        println!("Avg Rating:   -");
    }
    println!("Reviews:      {}", totals.reviews_count);
    Ok(())
}

fn cmd_pull(store: &Store, config: &Config) -> Result<()> {
    let client = remote::Client::new(&config.remote);
    let imported = remote::import_books(store, &client)?;
    println!("Imported {} new books", imported);
    Ok(())
}
