use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use prettytable::{Cell, Row as PrettyRow, Table};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};

use finwise::calculators::{
    calculate_education_loan, calculate_loan, calculate_premium, calculate_ratios, calculate_sip,
    AddOns, CityTier, CourseType, CoverageType, Debouncer, EducationLoanInput, InsuranceInput,
    LoanInput, LoanPhase, SipInput, ValidationErrors, ValuationInput, VehicleType,
};
use finwise::clock::{Clock, SystemClock};
use finwise::db::Database;
use finwise::environment::AppConfig;
use finwise::news::{Article, FeedStatus, NewsCache, NewsClient, NewsController, SortOrder};
use finwise::util::{format_inr, format_ratio};
use finwise::PILLARS;

#[derive(Parser)]
#[clap(name = "finwise", version, about = "Financial calculators, news feed and learning progress")]
struct Cli {
    /// Print results as JSON instead of tables
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// General loan EMI
    Loan {
        #[clap(long)]
        amount: f64,
        #[clap(long)]
        rate: f64,
        #[clap(long)]
        years: f64,
    },

    /// Education loan EMI with a moratorium period
    EducationLoan {
        #[clap(long)]
        amount: f64,
        /// Annual rate in percent; defaults to the course's rate
        #[clap(long)]
        rate: Option<f64>,
        #[clap(long, default_value = "10")]
        tenure: u32,
        #[clap(long, default_value = "1")]
        moratorium: u32,
        /// undergraduate, postgraduate, professional or abroad
        #[clap(long, default_value = "postgraduate")]
        course: CourseType,
    },

    /// Vehicle insurance premium estimate
    Insurance(InsuranceArgs),

    /// Valuation ratios (P/E, P/B, D/E, ROE)
    Ratios {
        #[clap(long)]
        price: f64,
        #[clap(long)]
        eps: f64,
        #[clap(long)]
        book_value: f64,
        #[clap(long, default_value = "0")]
        debt: f64,
        #[clap(long, default_value = "1")]
        equity: f64,
    },

    /// Systematic investment plan growth
    Sip {
        #[clap(long)]
        monthly: f64,
        #[clap(long, default_value = "12")]
        rate: f64,
        #[clap(long, default_value = "10")]
        years: u32,
    },

    /// Read "amount rate years" lines from stdin and recalculate the EMI once typing pauses
    Live,

    /// Browse the news feed
    News {
        /// Search term (bypasses the cache)
        #[clap(short, long)]
        query: Option<String>,
        #[clap(short, long, default_value = "all")]
        category: String,
        /// latest, oldest or relevance
        #[clap(short, long, default_value = "latest")]
        sort: SortOrder,
        /// Number of pages to load
        #[clap(short, long, default_value = "1")]
        pages: u32,
        /// Drop cached pages first
        #[clap(long)]
        refresh: bool,
    },

    /// Today's market digest
    Digest,

    /// AI summary of an article
    Summarize {
        #[clap(long)]
        title: String,
        #[clap(long, default_value = "")]
        summary: String,
    },

    /// Site analytics
    Stats,

    /// Bookmarked news articles
    Bookmarks {
        #[clap(subcommand)]
        action: BookmarkAction,
    },

    /// Learning progress
    Progress {
        #[clap(subcommand)]
        action: ProgressAction,
    },
}

#[derive(Args)]
struct InsuranceArgs {
    /// two_wheeler, car or commercial
    #[clap(long, default_value = "car")]
    vehicle: VehicleType,
    #[clap(long)]
    value: f64,
    #[clap(long, default_value = "0")]
    age: u32,
    /// metro, tier2 or tier3
    #[clap(long, default_value = "metro")]
    city: CityTier,
    /// comprehensive, third_party or own_damage
    #[clap(long, default_value = "comprehensive")]
    coverage: CoverageType,
    #[clap(long)]
    zero_dep: bool,
    #[clap(long)]
    engine_protection: bool,
    #[clap(long)]
    roadside: bool,
    #[clap(long)]
    consumables: bool,
    #[clap(long)]
    return_to_invoice: bool,
    #[clap(long)]
    personal_accident: bool,
}

#[derive(Subcommand)]
enum BookmarkAction {
    List,
    /// Bookmark an article, or remove it if already bookmarked
    Toggle {
        #[clap(long)]
        link: String,
        #[clap(long, default_value = "")]
        title: String,
        #[clap(long, default_value = "")]
        source: String,
    },
    Remove {
        #[clap(long)]
        link: String,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    Show,
    /// Record time spent on a pillar page
    Visit {
        #[clap(long)]
        pillar: String,
        #[clap(long)]
        seconds: u64,
    },
    /// Award learning points to a pillar
    Award {
        #[clap(long)]
        pillar: String,
        #[clap(long)]
        points: u64,
    },
    /// Mark a topic as read
    Read {
        #[clap(long)]
        topic: String,
    },
    /// Bookmark or un-bookmark a topic
    Topic {
        #[clap(long)]
        topic: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    finwise::logging::setup_logging("finwise", Level::INFO)?;

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let json = cli.json;

    match cli.command {
        Commands::Loan {
            amount,
            rate,
            years,
        } => {
            let result = calculate_loan(&LoanInput {
                amount,
                annual_rate: rate,
                tenure_years: years,
            });
            let result = check(result)?;
            if json {
                return print_json(&result);
            }
            print_summary(&[
                ("Monthly EMI", format_inr(result.emi)),
                ("Total interest", format_inr(result.total_interest)),
                ("Total payment", format_inr(result.total_payment)),
            ]);
            let mut table = header(&["Year", "Interest", "Principal", "Balance"]);
            for y in &result.yearly_breakdown {
                table.add_row(PrettyRow::new(vec![
                    Cell::new(&y.year.to_string()),
                    Cell::new(&format_inr(y.interest)),
                    Cell::new(&format_inr(y.principal)),
                    Cell::new(&format_inr(y.closing_balance)),
                ]));
            }
            table.printstd();
        }
        Commands::EducationLoan {
            amount,
            rate,
            tenure,
            moratorium,
            course,
        } => {
            let input = EducationLoanInput {
                loan_amount: amount,
                annual_rate: rate.unwrap_or_else(|| course.default_rate()),
                tenure_years: tenure,
                moratorium_years: moratorium,
                course_type: course,
            };
            let result = check(calculate_education_loan(&input))?;
            if json {
                return print_json(&result);
            }
            print_summary(&[
                ("Monthly EMI", format_inr(result.emi)),
                ("Moratorium interest", format_inr(result.accumulated_interest)),
                ("Principal after moratorium", format_inr(result.principal_after_moratorium)),
                ("Total interest", format_inr(result.total_interest)),
                ("Total payment", format_inr(result.total_payment)),
                ("Tax benefit (80E)", format_inr(result.tax_benefit)),
                ("Processing fee", format_inr(result.processing_fee)),
                ("Recommended monthly income", format_inr(result.recommended_income)),
            ]);
            let mut table = header(&["Year", "Phase", "Interest", "Principal", "Balance"]);
            for row in &result.yearly_breakdown {
                let phase = match row.phase {
                    LoanPhase::Moratorium => "moratorium",
                    LoanPhase::Repayment => "repayment",
                };
                table.add_row(PrettyRow::new(vec![
                    Cell::new(&row.year.to_string()),
                    Cell::new(phase),
                    Cell::new(&format_inr(row.interest)),
                    Cell::new(&format_inr(row.principal_paid)),
                    Cell::new(&format_inr(row.balance)),
                ]));
            }
            table.printstd();
        }
        Commands::Insurance(args) => {
            let input = InsuranceInput {
                vehicle_type: args.vehicle,
                vehicle_value: args.value,
                vehicle_age: args.age,
                city_tier: args.city,
                coverage: args.coverage,
                add_ons: AddOns {
                    zero_depreciation: args.zero_dep,
                    engine_protection: args.engine_protection,
                    roadside_assistance: args.roadside,
                    consumables: args.consumables,
                    return_to_invoice: args.return_to_invoice,
                    personal_accident: args.personal_accident,
                },
            };
            let result = check(calculate_premium(&input))?;
            if json {
                return print_json(&result);
            }
            print_summary(&[
                ("Base premium", format_inr(result.base_premium)),
                ("Add-ons", format_inr(result.add_on_premium)),
                ("GST (18%)", format_inr(result.gst)),
                ("Final premium", format_inr(result.final_premium)),
                (
                    "No-claim bonus",
                    format!("{}% ({})", result.ncb_percent, format_inr(result.ncb_discount)),
                ),
                ("Premium after NCB", format_inr(result.premium_after_ncb)),
            ]);
        }
        Commands::Ratios {
            price,
            eps,
            book_value,
            debt,
            equity,
        } => {
            let ratios = calculate_ratios(&ValuationInput {
                price,
                eps,
                book_value,
                total_debt: debt,
                total_equity: equity,
            });
            if json {
                return print_json(&ratios);
            }
            print_summary(&[
                ("P/E", format_ratio(ratios.pe)),
                ("P/B", format_ratio(ratios.pb)),
                ("D/E", format_ratio(ratios.de)),
                ("ROE %", format_ratio(ratios.roe)),
            ]);
        }
        Commands::Sip {
            monthly,
            rate,
            years,
        } => {
            let result = check(calculate_sip(&SipInput {
                monthly_investment: monthly,
                expected_return: rate,
                years,
            }))?;
            if json {
                return print_json(&result);
            }
            print_summary(&[
                ("Invested", format_inr(result.invested)),
                ("Estimated returns", format_inr(result.estimated_returns)),
                ("Future value", format_inr(result.future_value)),
            ]);
        }
        Commands::Live => run_live(&config).await?,
        Commands::News {
            query,
            category,
            sort,
            pages,
            refresh,
        } => {
            let db = Database::new(&config.database_path).await?;
            let client = NewsClient::new(config.api_base_url.clone())?;
            let mut feed =
                NewsController::new(client, NewsCache::new(db, SystemClock), config.page_limit);

            if refresh {
                let removed = feed.clear_cache().await?;
                info!("Cleared {} cached news entries", removed);
            }
            if !config.categories.iter().any(|c| c == &category) {
                bail!(
                    "Unknown category '{}'. Known categories: {}",
                    category,
                    config.categories.join(", ")
                );
            }

            feed.set_category(&category).await;
            feed.set_sort(sort).await;
            if let Some(term) = query {
                feed.search(&term).await;
            }
            for _ in 1..pages {
                if !feed.has_more() {
                    break;
                }
                feed.load_more().await;
            }

            if let FeedStatus::Error(message) = feed.status() {
                bail!("{}", message);
            }
            if json {
                return print_json(&feed.articles());
            }
            print_articles(feed.articles());
            if let Some(message) = feed.load_more_error() {
                eprintln!("{}", message.red());
            }
            if let Some(p) = feed.pagination() {
                println!(
                    "Page {} of {} ({} articles){}",
                    p.page,
                    p.total_pages,
                    p.total_items,
                    if p.has_next { ", more available" } else { "" }
                );
            }
        }
        Commands::Digest => {
            let client = NewsClient::new(config.api_base_url.clone())?;
            let digest = client
                .fetch_digest()
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            if json {
                return print_json(&digest);
            }
            println!("{} {}", "Daily digest".bold(), digest.date.bright_blue());
            println!("{}\n", digest.summary);
            for highlight in &digest.highlights {
                println!("  • {}", highlight);
            }
            if !digest.market_summary.is_empty() {
                println!("\n{} {}", "Markets:".bold(), digest.market_summary);
            }
        }
        Commands::Summarize { title, summary } => {
            let client = NewsClient::new(config.api_base_url.clone())?;
            let article = Article {
                title,
                summary,
                ..Article::default()
            };
            let text = client
                .summarize(&article)
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            println!("{}", text);
        }
        Commands::Stats => {
            let client = NewsClient::new(config.api_base_url.clone())?;
            let stats = client
                .fetch_stats()
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            if json {
                return print_json(&stats);
            }
            print_summary(&[
                ("Total page views", stats.total_page_views.to_string()),
                ("Monthly active users", stats.monthly_active_users.to_string()),
                ("Weekly active users", stats.weekly_active_users.to_string()),
                ("Calculator uses", stats.calculator_uses.to_string()),
            ]);
            let mut table = header(&["Calculator", "Uses"]);
            for calc in &stats.popular_calculators {
                table.add_row(PrettyRow::new(vec![
                    Cell::new(&calc.name),
                    Cell::new(&calc.uses.to_string()),
                ]));
            }
            table.printstd();
        }
        Commands::Bookmarks { action } => {
            let db = Database::new(&config.database_path).await?;
            match action {
                BookmarkAction::List => {
                    let bookmarks = db.get_bookmarks().await?;
                    if json {
                        return print_json(&bookmarks);
                    }
                    let articles: Vec<Article> =
                        bookmarks.into_iter().map(|b| b.article).collect();
                    print_articles(&articles);
                }
                BookmarkAction::Toggle {
                    link,
                    title,
                    source,
                } => {
                    let article = Article {
                        title,
                        source,
                        link,
                        ..Article::default()
                    };
                    let bookmarked = db
                        .toggle_bookmark(&article, SystemClock.now_millis())
                        .await?;
                    if bookmarked {
                        println!("{} {}", "Bookmarked".green(), article.link);
                    } else {
                        println!("{} {}", "Removed bookmark".yellow(), article.link);
                    }
                }
                BookmarkAction::Remove { link } => {
                    if !db.remove_bookmark(&link).await? {
                        bail!("No bookmark for {}", link);
                    }
                    println!("{} {}", "Removed bookmark".yellow(), link);
                }
            }
        }
        Commands::Progress { action } => {
            let db = Database::new(&config.database_path).await?;
            match action {
                ProgressAction::Show => show_progress(&db, json).await?,
                ProgressAction::Visit { pillar, seconds } => {
                    let percent = db
                        .record_visit(&pillar, seconds, SystemClock.now_millis())
                        .await?;
                    println!("{}: {}%", pillar, percent);
                }
                ProgressAction::Award { pillar, points } => {
                    let (total, percent) = db.award_points(&pillar, points).await?;
                    println!("{}: {}% ({} points total)", pillar, percent, total);
                }
                ProgressAction::Read { topic } => {
                    if db.mark_topic_read(&topic).await? {
                        println!("{} {}", "Marked as read:".green(), topic);
                    } else {
                        println!("Already read: {}", topic);
                    }
                }
                ProgressAction::Topic { topic } => {
                    if db.toggle_topic_bookmark(&topic).await? {
                        println!("{} {}", "Bookmarked topic".green(), topic);
                    } else {
                        println!("{} {}", "Removed topic bookmark".yellow(), topic);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Turns calculator field errors into one readable CLI error.
fn check<T>(result: Result<T, ValidationErrors>) -> Result<T> {
    result.map_err(|errors| {
        for e in &errors.errors {
            eprintln!("{} {}: {}", "invalid".red(), e.field, e.message);
        }
        anyhow::anyhow!("{} invalid input(s)", errors.errors.len())
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn header(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.add_row(PrettyRow::new(titles.iter().map(|t| Cell::new(t)).collect()));
    table
}

fn print_summary(lines: &[(&str, String)]) {
    let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in lines {
        println!("{:width$}  {}", label.bold(), value, width = width);
    }
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles.");
        return;
    }
    let mut table = header(&["Published", "Source", "Title", "Link"]);
    for article in articles {
        let title: String = article.title.chars().take(80).collect();
        table.add_row(PrettyRow::new(vec![
            Cell::new(&article.published),
            Cell::new(&article.source),
            Cell::new(&title),
            Cell::new(&article.link),
        ]));
    }
    table.printstd();
}

async fn show_progress(db: &Database, json: bool) -> Result<()> {
    let overall = db.overall_progress(PILLARS).await?;
    let points = db.learning_points().await?;
    if json {
        let mut pillars = serde_json::Map::new();
        for pillar in PILLARS {
            pillars.insert(pillar.to_string(), db.pillar_progress(pillar).await?.into());
        }
        return print_json(&serde_json::json!({
            "overall": overall,
            "learningPoints": points,
            "pillars": pillars,
            "readTopics": db.read_topics().await?,
            "bookmarkedTopics": db.bookmarked_topics().await?,
        }));
    }

    let activity = db.pillar_activity().await?;
    let mut table = header(&["Pillar", "Progress", "Visits", "Time spent"]);
    for pillar in PILLARS {
        let percent = db.pillar_progress(pillar).await?;
        let bar = format!(
            "{}{} {}%",
            "█".repeat((percent / 10) as usize),
            "░".repeat(10 - (percent / 10) as usize),
            percent
        );
        let (visits, seconds) = activity
            .get(*pillar)
            .map(|a| (a.visits, a.seconds_spent))
            .unwrap_or((0, 0));
        table.add_row(PrettyRow::new(vec![
            Cell::new(pillar),
            Cell::new(&bar),
            Cell::new(&visits.to_string()),
            Cell::new(&format!("{}m {}s", seconds / 60, seconds % 60)),
        ]));
    }
    table.printstd();
    println!("Overall: {}%  Points: {}", overall, points);
    Ok(())
}

/// Recalculates a loan EMI from stdin lines, once input has paused.
async fn run_live(config: &AppConfig) -> Result<()> {
    eprintln!("Enter: <amount> <rate %> <years>  (Ctrl-D to quit)");

    let (debouncer, mut results) = Debouncer::spawn(config.debounce, |input: &LoanInput| {
        calculate_loan(input)
    });

    let printer = tokio::spawn(async move {
        while results.changed().await.is_ok() {
            let latest = results.borrow_and_update().clone();
            match latest {
                Some(Ok(result)) => println!(
                    "EMI {}  interest {}  total {}",
                    format_inr(result.emi).green(),
                    format_inr(result.total_interest),
                    format_inr(result.total_payment)
                ),
                Some(Err(errors)) => eprintln!("{}", errors.to_string().red()),
                None => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let fields: Vec<f64> = line
            .split_whitespace()
            .filter_map(|f| f.replace(',', "").parse().ok())
            .collect();
        match fields.as_slice() {
            [amount, rate, years] => debouncer.update(LoanInput {
                amount: *amount,
                annual_rate: *rate,
                tenure_years: *years,
            }),
            _ => eprintln!("{}", "expected three numbers".yellow()),
        }
    }

    debouncer.finish().await;
    printer.await?;
    Ok(())
}
