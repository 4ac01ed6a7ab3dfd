//! Prompt synthesis for the generation backend.

use chrono::{Datelike, Local};

/// Calendar season derived from the wall-clock month. The Russian token is
/// injected into topic prompts so generated posts match the time of year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn current() -> Self {
        Season::from_month(Local::now().month())
    }

    pub fn as_ru(&self) -> &'static str {
        match self {
            Season::Winter => "зима",
            Season::Spring => "весна",
            Season::Summer => "лето",
            Season::Autumn => "осень",
        }
    }
}

/// Which service a template writes about; recorded in generation logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Pedicure,
    ManicurePedicure,
}

impl ServiceType {
    pub fn for_template(template_key: &str) -> Self {
        match template_key {
            "pedicure_work" | "seasonal_special" | "client_feedback" => ServiceType::Pedicure,
            _ => ServiceType::ManicurePedicure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Pedicure => "pedicure",
            ServiceType::ManicurePedicure => "manicure_pedicure",
        }
    }
}

/// Template prompt with the mandatory contact block appended.
pub fn template_prompt(template_text: &str, contact_block: &str) -> String {
    format!(
        "{template_text}\n\nВ конце поста **обязательно** добавь следующий блок с контактами:\n\n{contact_block}"
    )
}

/// Free-topic prompt, adapted to the current season.
pub fn topic_prompt(topic: &str, season: Season) -> String {
    format!(
        "Ты — Валерия, мастер маникюра и педикюра из Самары. Твой стиль — дружелюбный, живой и искренний. \
         Напиши интересный и полезный пост на тему: '{topic}'. \
         Учитывай время года: сейчас {}. \
         Пиши простым языком, как будто общаешься с подругой. Используй 1-2 уместных эмодзи (например, 💖, ✨, 💅, 🔥). \
         Текст должен быть информативным и engaging. Не используй специальное форматирование (жирный шрифт, курсив). \
         Длина текста — около 300-500 символов.",
        season.as_ru()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_map_to_seasons() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
    }

    #[test]
    fn topic_prompt_varies_only_by_season() {
        let topic = "Зимние дизайны ногтей";
        let january = topic_prompt(topic, Season::from_month(1));
        let july = topic_prompt(topic, Season::from_month(7));

        assert!(january.contains("сейчас зима"));
        assert!(july.contains("сейчас лето"));
        assert_eq!(january.replace("зима", "лето"), july);
    }

    #[test]
    fn template_prompt_appends_contact_block() {
        let prompt = template_prompt("Напиши пост о работе.", "📱 Запись: в личные сообщения");
        assert!(prompt.starts_with("Напиши пост о работе."));
        assert!(prompt.ends_with("📱 Запись: в личные сообщения"));
        assert!(prompt.contains("блок с контактами"));
    }

    #[test]
    fn pedicure_templates_map_to_pedicure_service() {
        assert_eq!(
            ServiceType::for_template("pedicure_work"),
            ServiceType::Pedicure
        );
        assert_eq!(
            ServiceType::for_template("seasonal_special"),
            ServiceType::Pedicure
        );
        assert_eq!(
            ServiceType::for_template("client_feedback"),
            ServiceType::Pedicure
        );
        assert_eq!(
            ServiceType::for_template("beautiful_work"),
            ServiceType::ManicurePedicure
        );
    }
}
