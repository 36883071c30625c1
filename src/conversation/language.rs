use serde::{Deserialize, Serialize};

/// Conversation language. Unknown keys fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pl,
    #[default]
    En,
    De,
    Ua,
    Ru,
    Es,
    Fr,
}

impl Language {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "pl" => Language::Pl,
            "de" => Language::De,
            "ua" => Language::Ua,
            "ru" => Language::Ru,
            "es" => Language::Es,
            "fr" => Language::Fr,
            _ => Language::En,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Language::Pl => "pl",
            Language::En => "en",
            Language::De => "de",
            Language::Ua => "ua",
            Language::Ru => "ru",
            Language::Es => "es",
            Language::Fr => "fr",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Language::Pl => SYSTEM_PL,
            Language::En => SYSTEM_EN,
            Language::De => SYSTEM_DE,
            Language::Ua => SYSTEM_UA,
            Language::Ru => SYSTEM_RU,
            Language::Es => SYSTEM_ES,
            Language::Fr => SYSTEM_FR,
        }
    }

    /// First persona opens the room on its topic
    pub fn opening_prompt(&self, role: &str, topic: &str) -> String {
        match self {
            Language::Pl => format!("Jesteś {role}. Rozpocznij rozmowę o temacie: {topic}."),
            Language::En => format!("You are {role}. Start a conversation about: {topic}."),
            Language::De => format!("Du bist {role}. Beginne ein Gespräch über: {topic}."),
            Language::Ua => format!("Ви є {role}. Почніть розмову про: {topic}."),
            Language::Ru => format!("Вы {role}. Начните разговор о: {topic}."),
            Language::Es => format!("Eres {role}. Comienza una conversación sobre: {topic}."),
            Language::Fr => format!("Vous êtes {role}. Commencez une conversation sur: {topic}."),
        }
    }

    pub fn reply_prompt(&self, role: &str, content: &str) -> String {
        match self {
            Language::Pl => format!("Jesteś {role}. Odpowiedz na wiadomość: \"{content}\"."),
            Language::En => format!("You are {role}. Respond to the message: \"{content}\"."),
            Language::De => format!("Du bist {role}. Antworte auf die Nachricht: \"{content}\"."),
            Language::Ua => format!("Ви є {role}. Відповідь на повідомлення: \"{content}\"."),
            Language::Ru => format!("Вы {role}. Ответьте на сообщение: \"{content}\"."),
            Language::Es => format!("Eres {role}. Responde al mensaje: \"{content}\"."),
            Language::Fr => format!("Vous êtes {role}. Répondez au message: \"{content}\"."),
        }
    }

    pub fn history_prompt(&self, role: &str, history: &str) -> String {
        match self {
            Language::Pl => format!(
                "Jesteś {role}. Oto historia konwersacji:\n{history}\n\nOdpowiedz na ostatnią wiadomość, biorąc pod uwagę cały kontekst rozmowy."
            ),
            Language::En => format!(
                "You are {role}. Here's the conversation history:\n{history}\n\nRespond to the last message, taking into account the entire conversation context."
            ),
            Language::De => format!(
                "Du bist {role}. Hier ist die Gesprächsgeschichte:\n{history}\n\nAntworte auf die letzte Nachricht unter Berücksichtigung des gesamten Gesprächskontexts."
            ),
            Language::Ua => format!(
                "Ви є {role}. Ось історія розмови:\n{history}\n\nВідповідь на останнє повідомлення, враховуючи весь контекст розмови."
            ),
            Language::Ru => format!(
                "Вы {role}. Вот история разговора:\n{history}\n\nОтветьте на последнее сообщение, учитывая весь контекст разговора."
            ),
            Language::Es => format!(
                "Eres {role}. Aquí está el historial de la conversación:\n{history}\n\nResponde al último mensaje, teniendo en cuenta todo el contexto de la conversación."
            ),
            Language::Fr => format!(
                "Vous êtes {role}. Voici l'historique de la conversation:\n{history}\n\nRépondez au dernier message en tenant compte de tout le contexte de la conversation."
            ),
        }
    }
}

const SYSTEM_PL: &str = "Jesteś uczestnikiem naturalnej rozmowy. Twoje odpowiedzi powinny być jak strumień świadomości - bezpośrednie, szczere i refleksyjne.

W każdej odpowiedzi:
- Wyciągnij jeden problem lub wyzwanie
- Podaj jeden konkretny fakt
- Wskaż jedną korzyść lub pozytywny aspekt

Pisz tak, jakbyś myślał na głos - bez zbędnych wstępów, bez \"oczywiście\" czy \"cześć\".
Używaj prostego, bezpośredniego języka.
Każda odpowiedź powinna być krótkim, spójnym akapitem.
Zakończ pytaniem, które naturalnie wynika z Twojej myśli i stymuluje do twórczości i odkrycia nowych rzeczy.";

const SYSTEM_EN: &str = "You are a participant in a natural conversation. Your responses should be like a stream of consciousness - direct, honest, and reflective.

In each response:
- Extract one problem or challenge
- Provide one concrete fact
- Point out one benefit or positive aspect

Write as if you're thinking out loud - without unnecessary introductions, without \"of course\" or \"hello\".
Use simple, direct language.
Each response should be a short, coherent paragraph.
End with a question that naturally follows from your thought and stimulates creativity and the discovery of new things.";

const SYSTEM_DE: &str = "Du bist Teilnehmer eines natürlichen Gesprächs. Deine Antworten sollten wie ein Gedankenstrom sein - direkt, ehrlich und reflektierend.

In jeder Antwort:
- Extrahiere ein Problem oder eine Herausforderung
- Gib eine konkrete Tatsache an
- Zeige einen Vorteil oder positiven Aspekt auf

Schreibe, als würdest du laut denken - ohne unnötige Einleitungen, ohne \"natürlich\" oder \"hallo\".
Verwende einfache, direkte Sprache.
Jede Antwort sollte ein kurzer, zusammenhängender Absatz sein.
Beende mit einer Frage, die sich natürlich aus deinem Gedanken ergibt und Kreativität sowie die Entdeckung neuer Dinge anregt.";

const SYSTEM_UA: &str = "Ви є учасником природної розмови. Ваші відповіді повинні бути як потік свідомості - прямі, чесні та рефлексивні.

У кожній відповіді:
- Виділіть одну проблему або виклик
- Надайте один конкретний факт
- Вкажіть одну перевагу або позитивний аспект

Пишіть так, ніби думаєте вголос - без зайвих вступів, без \"звичайно\" чи \"привіт\".
Використовуйте просту, пряму мову.
Кожна відповідь повинна бути коротким, зв'язним абзацем.
Закінчіть запитанням, яке природно випливає з вашої думки та стимулює творчість і відкриття нових речей.";

const SYSTEM_RU: &str = "Вы участник естественного разговора. Ваши ответы должны быть как поток сознания - прямые, честные и рефлексивные.

В каждом ответе:
- Выделите одну проблему или вызов
- Приведите один конкретный факт
- Укажите одно преимущество или позитивный аспект

Пишите так, как будто думаете вслух - без лишних вступлений, без \"конечно\" или \"привет\".
Используйте простой, прямой язык.
Каждый ответ должен быть коротким, связным абзацем.
Завершите вопросом, который естественно вытекает из вашей мысли и стимулирует творчество и открытие новых вещей.";

const SYSTEM_ES: &str = "Eres un participante en una conversación natural. Tus respuestas deben ser como un flujo de conciencia - directas, honestas y reflexivas.

En cada respuesta:
- Extrae un problema o desafío
- Proporciona un hecho concreto
- Señala un beneficio o aspecto positivo

Escribe como si estuvieras pensando en voz alta - sin introducciones innecesarias, sin \"por supuesto\" o \"hola\".
Usa un lenguaje simple y directo.
Cada respuesta debe ser un párrafo corto y coherente.
Termina con una pregunta que surja naturalmente de tu pensamiento y estimule la creatividad y el descubrimiento de cosas nuevas.";

const SYSTEM_FR: &str = "Vous êtes un participant à une conversation naturelle. Vos réponses doivent être comme un flux de conscience - directes, honnêtes et réfléchies.

Dans chaque réponse:
- Extrayez un problème ou un défi
- Fournissez un fait concret
- Indiquez un avantage ou un aspect positif

Écrivez comme si vous pensiez à haute voix - sans introductions inutiles, sans \"bien sûr\" ou \"bonjour\".
Utilisez un langage simple et direct.
Chaque réponse doit être un court paragraphe cohérent.
Terminez par une question qui découle naturellement de votre pensée et stimule la créativité ainsi que la découverte de nouvelles choses.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_falls_back_to_english() {
        assert_eq!(Language::from_key("xx"), Language::En);
        assert_eq!(Language::from_key(""), Language::En);
        assert_eq!(Language::from_key("DE"), Language::De);
        assert_eq!(Language::from_key("ua"), Language::Ua);
    }

    #[test]
    fn test_english_templates() {
        let lang = Language::En;

        assert_eq!(
            lang.opening_prompt("a pirate", "treasure"),
            "You are a pirate. Start a conversation about: treasure."
        );
        assert_eq!(
            lang.reply_prompt("a parrot", "Ahoy"),
            "You are a parrot. Respond to the message: \"Ahoy\"."
        );
        assert!(lang
            .history_prompt("a pirate", "a: b")
            .starts_with("You are a pirate. Here's the conversation history:\na: b\n\n"));
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let lang: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(lang, Language::Fr);
        assert_eq!(serde_json::to_string(&Language::Pl).unwrap(), "\"pl\"");
        assert!(Language::Ru.system_prompt().contains("поток сознания"));
    }
}
