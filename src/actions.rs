//! Callback actions decoded from inline keyboard payloads.
//!
//! Every callback string is decoded once at the boundary into a tagged enum,
//! so the handler can match exhaustively instead of comparing strings.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Generate a post from a randomly picked template.
    GeneratePost,
    /// Ask the operator for a free-form topic.
    GenerateTopicPost,
    /// Show the template catalog keyboard.
    ChooseTemplate,
    /// Generate a post from a specific template.
    Template(String),
    RegeneratePost,
    RegenerateTopicPost,
    AddPhoto,
    AddMorePhotos,
    PhotosDone,
    EditPostText,
    SkipEditing,
    PublishNow,
    Reset,
}

impl Action {
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "generate_post" => Action::GeneratePost,
            "generate_topic_post" => Action::GenerateTopicPost,
            "choose_template" => Action::ChooseTemplate,
            "regenerate_post" => Action::RegeneratePost,
            "regenerate_post_topic" => Action::RegenerateTopicPost,
            "add_photo" => Action::AddPhoto,
            "add_more_photos" => Action::AddMorePhotos,
            "photos_done" => Action::PhotosDone,
            "edit_post_text" => Action::EditPostText,
            "skip_editing" => Action::SkipEditing,
            "publish_now" => Action::PublishNow,
            "reset" => Action::Reset,
            _ => {
                return data
                    .strip_prefix("template_")
                    .filter(|key| !key.is_empty())
                    .map(|key| Action::Template(key.to_string()))
            }
        };
        Some(action)
    }

    /// The payload carried by the inline keyboard button for this action.
    pub fn callback_data(&self) -> String {
        match self {
            Action::GeneratePost => "generate_post".to_string(),
            Action::GenerateTopicPost => "generate_topic_post".to_string(),
            Action::ChooseTemplate => "choose_template".to_string(),
            Action::Template(key) => format!("template_{key}"),
            Action::RegeneratePost => "regenerate_post".to_string(),
            Action::RegenerateTopicPost => "regenerate_post_topic".to_string(),
            Action::AddPhoto => "add_photo".to_string(),
            Action::AddMorePhotos => "add_more_photos".to_string(),
            Action::PhotosDone => "photos_done".to_string(),
            Action::EditPostText => "edit_post_text".to_string(),
            Action::SkipEditing => "skip_editing".to_string(),
            Action::PublishNow => "publish_now".to_string(),
            Action::Reset => "reset".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_payloads_round_trip() {
        let actions = [
            Action::GeneratePost,
            Action::GenerateTopicPost,
            Action::ChooseTemplate,
            Action::Template("beautiful_work".to_string()),
            Action::RegeneratePost,
            Action::RegenerateTopicPost,
            Action::AddPhoto,
            Action::AddMorePhotos,
            Action::PhotosDone,
            Action::EditPostText,
            Action::SkipEditing,
            Action::PublishNow,
            Action::Reset,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.callback_data()), Some(action));
        }
    }

    #[test]
    fn unknown_payloads_are_rejected() {
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("generate"), None);
        assert_eq!(Action::parse("template_"), None);
        assert_eq!(Action::parse("publish_now_twice"), None);
    }
}
