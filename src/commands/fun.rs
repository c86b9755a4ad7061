use async_trait::async_trait;
use rand::Rng;

use crate::command::{Args, CommandContext, CommandHandler, Dice, Reply};
use crate::error::CommandResult;
use crate::model::{colors, EmbedBuilder};

const ANSWERS: [&str; 20] = [
    "It is certain.",
    "It is decidedly so.",
    "Without a doubt.",
    "Yes, definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
];

const DEFAULT_DIE: Dice = Dice { count: 1, sides: 100 };

pub struct EightBall;

#[async_trait]
impl CommandHandler for EightBall {
    async fn run(&self, _ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let question = args.require_text("question")?;
        let answer = ANSWERS[rand::rng().random_range(0..ANSWERS.len())];
        let embed = EmbedBuilder::new()
            .title("🎱 Magic 8-Ball")
            .field("Question", question, false)
            .field("Answer", answer, false)
            .color(colors::PURPLE)
            .build();
        Ok(embed.into())
    }
}

pub struct Roll;

#[async_trait]
impl CommandHandler for Roll {
    async fn run(&self, _ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let dice = args.dice("NdM").unwrap_or(DEFAULT_DIE);
        let rolls = dice.roll(&mut rand::rng());

        let description = match rolls.as_slice() {
            [single] => format!("🎯 You rolled: **{}**", single),
            many => format!(
                "🎲 Rolls: {}\n🎯 Total: **{}**",
                many.iter().map(u32::to_string).collect::<Vec<_>>().join(", "),
                many.iter().map(|&r| u64::from(r)).sum::<u64>()
            ),
        };
        let embed = EmbedBuilder::new()
            .title("🎲 Dice Roll Result")
            .description(description)
            .color(colors::PURPLE)
            .build();
        Ok(embed.into())
    }
}

/// Reads the individual rolls back out of a roll reply.
#[cfg(test)]
pub(crate) fn rolls_from(description: &str) -> Vec<u32> {
    let first = description.lines().next().unwrap_or_default();
    if let Some(list) = first.strip_prefix("🎲 Rolls: ") {
        return list.split(", ").map(|r| r.parse().unwrap()).collect();
    }
    let single = first
        .trim_start_matches("🎯 You rolled: **")
        .trim_end_matches("**");
    vec![single.parse().unwrap()]
}

pub struct Choose;

#[async_trait]
impl CommandHandler for Choose {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let options: Vec<&str> = args
            .text("options...")
            .into_iter()
            .chain(args.rest().iter().map(String::as_str))
            .collect();

        if options.len() < 2 {
            return Ok(Reply::text(format!(
                "❗ Give me at least two options, like `{}choose tea coffee`.",
                ctx.prefix()
            )));
        }
        let pick = options[rand::rng().random_range(0..options.len())];
        Ok(Reply::text(format!("🤔 I choose: **{}**", pick)))
    }
}
