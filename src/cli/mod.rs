use anyhow::Result;
use serde::Serialize;

use crate::dataset::MatchTable;
use crate::models::{MatchRecord, Scope, Season, TeamProfile};
use crate::services::{
    champions_goals_test, compare_teams, distribution, head_to_head_record, home_advantage_test,
    includes_partial_seasons, is_significant, overview, resolve_team, season_trend,
    shots_goals_correlation, team_profile, teams, top_teams, Metric,
};
use crate::utils::format_signed;

/// Shared options for every analysis command.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub table: &'a MatchTable,
    pub scope: Scope,
    pub json: bool,
}

impl<'a> Context<'a> {
    fn rows(&self) -> Vec<&'a MatchRecord> {
        self.table.select(self.scope)
    }

    fn detailed(&self) -> bool {
        self.scope == Scope::Detailed
    }
}

/// Print `value` as JSON, or hand it to `render` for the text layout.
fn emit<T: Serialize>(ctx: &Context, value: &T, render: impl FnOnce(&T)) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn warn_partial(ctx: &Context, rows: &[&MatchRecord]) {
    if !ctx.json && includes_partial_seasons(rows) {
        println!("⚠️  Includes seasons before 2000/01: only results and goals are complete there.");
        let extra: Vec<&str> = Metric::available_in(Scope::Detailed)
            .into_iter()
            .filter(|m| !Metric::available_in(Scope::Full).contains(m))
            .map(|m| m.name())
            .collect();
        println!("   Use --scope detailed for {}.\n", extra.join(", "));
    }
}

pub fn show_overview(ctx: &Context) -> Result<()> {
    let rows = ctx.rows();
    warn_partial(ctx, &rows);
    let summary = overview(&rows)?;

    emit(ctx, &summary, |s| {
        println!("📊 Dataset Overview:");
        println!("   Matches: {}", s.matches);
        println!("   Seasons: {} ({} to {})", s.seasons, s.first_season, s.last_season);
        println!("   Teams: {}", s.teams);
        println!("\n🏁 Results:");
        println!("   Home wins: {}", s.results.home_wins);
        println!("   Draws: {}", s.results.draws);
        println!("   Away wins: {}", s.results.away_wins);
        println!("\n⚽ Goals per match:");
        println!("   Home: {:.2}", s.mean_home_goals);
        println!("   Away: {:.2}", s.mean_away_goals);
        println!("   Total: {:.2}", s.mean_total_goals);
    })
}

pub fn show_seasons(ctx: &Context, metric: Metric, from: Option<Season>) -> Result<()> {
    let rows = ctx.table.select_from(ctx.scope, from);
    warn_partial(ctx, &rows);
    let trend = season_trend(&rows, metric)?;

    emit(ctx, &trend, |trend| {
        println!("📅 Average {} per match by season:\n", metric);
        for point in trend {
            println!(
                "   {}  {:>6.2}  (total {:.0} over {} matches)",
                point.season, point.mean, point.total, point.matches
            );
        }
    })
}

pub fn show_top_teams(ctx: &Context, metric: Metric, from: Option<Season>, limit: usize) -> Result<()> {
    let rows = ctx.table.select_from(ctx.scope, from);
    warn_partial(ctx, &rows);
    let ranked = top_teams(&rows, metric, limit)?;

    emit(ctx, &ranked, |ranked| {
        println!("🏆 Top {} teams by {}:\n", ranked.len(), metric);
        for (i, entry) in ranked.iter().enumerate() {
            println!("{:>3}. {:<28} {:.0}", i + 1, entry.team, entry.value);
        }
    })
}

pub fn show_distribution(ctx: &Context, metric: Metric, from: Option<Season>) -> Result<()> {
    let rows = ctx.table.select_from(ctx.scope, from);
    warn_partial(ctx, &rows);
    let counts = distribution(&rows, metric)?;

    emit(ctx, &counts, |counts| {
        println!("📊 Distribution of {}:\n", metric);
        let widest = counts.values().copied().max().unwrap_or(1).max(1);
        for (value, count) in counts {
            let bar = "█".repeat((count * 40).div_ceil(widest));
            println!("   {:>3} | {:<40} {}", value, bar, count);
        }
    })
}

#[derive(Serialize)]
struct TestReport {
    champions: Option<crate::models::TTestResult>,
    home_advantage: Option<crate::models::ZTestResult>,
    correlation: Option<crate::models::CorrelationResult>,
}

pub fn show_tests(ctx: &Context) -> Result<()> {
    let rows = ctx.rows();
    warn_partial(ctx, &rows);

    let report = TestReport {
        champions: champions_goals_test(&rows)
            .map_err(|e| tracing::warn!("champions t-test skipped: {}", e))
            .ok(),
        home_advantage: home_advantage_test(&rows)
            .map_err(|e| tracing::warn!("home advantage z-test skipped: {}", e))
            .ok(),
        correlation: shots_goals_correlation(&rows)
            .map_err(|e| tracing::info!("correlation skipped: {}", e))
            .ok(),
    };

    emit(ctx, &report, |report| {
        println!("🧪 Hypothesis tests (α = 0.05)\n");

        println!("🏆 Champions vs others: home goals (Welch t-test)");
        match &report.champions {
            Some(t) => {
                println!("   t = {:.4}, p = {:.4}, df = {:.1}", t.t_statistic, t.p_value, t.degrees_of_freedom);
                println!(
                    "   Champions mean {:.4} (n={}) | Others mean {:.4} (n={})",
                    t.champions_mean, t.champions_n, t.others_mean, t.others_n
                );
                println!("   Significant: {}", yes_no(is_significant(t.p_value)));
            }
            None => println!("   Not enough data"),
        }

        println!("\n🏠 Home advantage (two-proportion z-test, one-sided)");
        match &report.home_advantage {
            Some(z) => {
                println!("   z = {:.4}, p = {:.4}", z.z_statistic, z.p_value);
                println!(
                    "   Home wins {:.1}% | Away wins {:.1}%",
                    z.home_share * 100.0,
                    z.away_share * 100.0
                );
                println!("   Significant: {}", yes_no(is_significant(z.p_value)));
            }
            None => println!("   Not enough data"),
        }

        println!("\n⚽ Shots on target vs goals (Pearson)");
        match &report.correlation {
            Some(c) => {
                println!("   r = {:.4}, p = {:.4}, R² = {:.1}%", c.r, c.p_value, c.r_squared * 100.0);
                println!("   Trendline: goals = {:.4} + {:.4} × shots on target", c.intercept, c.slope);
                println!("   Strength: {:?}, significant: {}", c.strength, yes_no(is_significant(c.p_value)));
            }
            None => println!("   Requires --scope detailed"),
        }
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn show_teams(ctx: &Context) -> Result<()> {
    let names = teams(&ctx.rows());
    emit(ctx, &names, |names| {
        println!("📋 {} teams:\n", names.len());
        for name in names {
            println!("   • {}", name);
        }
    })
}

fn print_profile(profile: &TeamProfile) {
    println!("📊 {}:", profile.team);
    println!("   Games: {}", profile.games);
    println!("   Record: {}W {}D {}L", profile.wins, profile.draws, profile.losses);
    println!("   Performance: {:.1}%", profile.performance);
    println!(
        "   Goals: {} scored, {} conceded ({})",
        profile.goals_scored,
        profile.goals_conceded,
        format_signed(profile.goal_difference)
    );
    if let Some(advanced) = &profile.advanced {
        println!("   Shots on target: {}", advanced.shots_on_target);
        println!("   Efficiency: {:.1}%", advanced.efficiency);
        println!("   Yellow cards: {}", advanced.yellow_cards);
    }
}

pub fn show_team(ctx: &Context, name: &str) -> Result<()> {
    let rows = ctx.rows();
    warn_partial(ctx, &rows);
    let team = resolve_team(&rows, name)?;
    let profile = team_profile(&rows, &team, ctx.detailed())?;

    emit(ctx, &profile, |profile| {
        print_profile(profile);
        println!("\n📈 Performance by season:");
        for season in &profile.seasons {
            println!(
                "   {}  {:>5.1}%  ({} games, {} wins, {} draws)",
                season.season, season.performance, season.games, season.wins, season.draws
            );
        }
    })
}

pub fn show_head_to_head(ctx: &Context, team: &str, opponent: &str) -> Result<()> {
    let rows = ctx.rows();
    let team = resolve_team(&rows, team)?;
    let opponent = resolve_team(&rows, opponent)?;
    let record = head_to_head_record(&rows, &team, &opponent);

    emit(ctx, &record, |record| {
        if record.meetings == 0 {
            println!("📭 No matches found between {} and {}.", record.team, record.opponent);
            return;
        }
        println!("⚔️  {} vs {} ({} meetings):", record.team, record.opponent, record.meetings);
        println!("   {} wins: {}", record.team, record.team_wins);
        println!("   Draws: {}", record.draws);
        println!("   {} wins: {}", record.opponent, record.opponent_wins);
        println!("\n📅 Last {} meetings:", record.recent.len());
        for meeting in &record.recent {
            let venue = if meeting.home_team == record.team { "🏠" } else { "✈️ " };
            println!(
                "   {} {}: {} {}-{} {} ({})",
                venue,
                meeting.date.format("%d/%m/%Y"),
                meeting.home_team,
                meeting.home_goals,
                meeting.away_goals,
                meeting.away_team,
                meeting.result
            );
        }
    })
}

pub fn show_compare(ctx: &Context, first: &str, second: &str) -> Result<()> {
    let rows = ctx.rows();
    warn_partial(ctx, &rows);
    let first = resolve_team(&rows, first)?;
    let second = resolve_team(&rows, second)?;
    let comparison = compare_teams(&rows, &first, &second, ctx.detailed())?;

    emit(ctx, &comparison, |c| {
        print_profile(&c.first);
        println!();
        print_profile(&c.second);

        println!(
            "\n📐 Difference ({} − {}): games {}, wins {}, draws {}, performance {:+.1}%",
            c.first.team,
            c.second.team,
            format_signed(c.first.games as i64 - c.second.games as i64),
            format_signed(c.first.wins as i64 - c.second.wins as i64),
            format_signed(c.first.draws as i64 - c.second.draws as i64),
            c.first.performance - c.second.performance
        );

        println!("\n📈 Performance by season:");
        let mut seasons: Vec<Season> = c
            .first
            .seasons
            .iter()
            .chain(&c.second.seasons)
            .map(|s| s.season)
            .collect();
        seasons.sort();
        seasons.dedup();
        for season in seasons {
            let cell = |profile: &TeamProfile| {
                profile
                    .seasons
                    .iter()
                    .find(|s| s.season == season)
                    .map_or_else(|| "    -".to_string(), |s| format!("{:>5.1}%", s.performance))
            };
            println!("   {}  {}  {}", season, cell(&c.first), cell(&c.second));
        }
    })
}
