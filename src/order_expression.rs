use crate::data_types::menu_types::{Menu, MenuRow};
use crate::errors::OrderExpressionError;
use crate::tokenizer::split_escaped;
use crate::user_choice::UserChoice;

pub const DISH_SEPARATOR: &str = "+";
pub const SIDE_SEPARATOR: &str = "&";

/// Turns `"fusilli + pollo & patate"` into one choice per `+` group.
///
/// Every step taken is appended to `log` as a line for the user, so it is
/// filled even when the expression is rejected.
pub fn parse_order_expression(
    menu: &Menu,
    expression: &str,
    log: &mut Vec<String>,
) -> Result<Vec<UserChoice>, OrderExpressionError> {
    let mut choices = Vec::new();

    for group in split_escaped(expression, DISH_SEPARATOR) {
        let mut choice = UserChoice::new();

        for token in split_escaped(&group, SIDE_SEPARATOR) {
            choice.add(resolve_token(menu, &token, log)?)?;
        }

        if choice.customized() {
            log.push(format!("Piatto personalizzato: {}", choice));
        }
        choices.push(choice);
    }

    Ok(choices)
}

fn resolve_token(
    menu: &Menu,
    token: &str,
    log: &mut Vec<String>,
) -> Result<MenuRow, OrderExpressionError> {
    let token = token.trim();
    let quoted = token.len() >= 2 && token.starts_with('"') && token.ends_with('"');
    let query = token.trim_matches('"').trim();

    if query.is_empty() {
        return Err(OrderExpressionError::EmptyDish);
    }

    let found = menu.find_dishes(query);

    match found.as_slice() {
        [dish] => {
            log.push(format!("Trovato: {} ({})", dish.content, dish.category));
            Ok((*dish).clone())
        }
        _ if quoted => {
            log.push(format!("Aggiungo testualmente: '{}'", query));
            Ok(MenuRow::literal(query))
        }
        [] => Err(OrderExpressionError::NotFound(query.to_string())),
        _ => Err(OrderExpressionError::Ambiguous {
            query: query.to_string(),
            candidates: found.iter().map(|d| d.content.clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::menu_types::Category;
    use crate::errors::CombinationError;

    fn menu() -> Menu {
        let mut menu = Menu::new(None);
        menu.add_row(MenuRow::new("Fusilli con salsiccia pomodoro e olive", Category::FirstCourse));
        menu.add_row(MenuRow::new("Pasta al pesto", Category::FirstCourse));
        menu.add_row(MenuRow::new("Pasta al pomodoro", Category::FirstCourse));
        menu.add_row(MenuRow::new("Scorfano con ginger lime", Category::MainCourse));
        menu.add_row(MenuRow::new("Peposo con patate in umido", Category::MainCourse));
        menu.add_row(MenuRow::new("Piselli", Category::SideDish));
        menu.add_row(MenuRow::new("Insalata verde", Category::SideDish));
        menu.add_row(MenuRow::new("Macedonia", Category::Fruit));
        menu
    }

    fn rendered(choices: &[UserChoice]) -> Vec<String> {
        choices.iter().map(UserChoice::to_string).collect()
    }

    #[test]
    fn test_customized_dish() {
        let mut log = Vec::new();
        let choices = parse_order_expression(&menu(), "scorfano & piselli", &mut log).unwrap();

        assert_eq!(rendered(&choices), vec!["Scorfano con ginger lime con Piselli"]);
        assert_eq!(
            log,
            vec![
                "Trovato: Scorfano con ginger lime (secondi piatti)",
                "Trovato: Piselli (contorni)",
                "Piatto personalizzato: Scorfano con ginger lime con Piselli",
            ]
        );
    }

    #[test]
    fn test_multiple_dishes() {
        let mut log = Vec::new();
        let choices = parse_order_expression(&menu(), "fusilli + peposo & insalata + macedonia", &mut log)
            .unwrap();

        assert_eq!(
            rendered(&choices),
            vec![
                "Fusilli con salsiccia pomodoro e olive",
                "Peposo con patate in umido con Insalata verde",
                "Macedonia",
            ]
        );
    }

    #[test]
    fn test_quoted_literal() {
        let mut log = Vec::new();
        let choices =
            parse_order_expression(&menu(), "\"pasta senza glutine al ragù\"", &mut log).unwrap();

        assert_eq!(rendered(&choices), vec!["pasta senza glutine al ragù"]);
        assert_eq!(choices[0].dishes()[0].category, Category::Empty);
        assert_eq!(log, vec!["Aggiungo testualmente: 'pasta senza glutine al ragù'"]);
    }

    #[test]
    fn test_quoted_exact_match_uses_menu() {
        let mut log = Vec::new();
        let choices = parse_order_expression(&menu(), "\"piselli\"", &mut log).unwrap();
        assert_eq!(choices[0].dishes()[0].category, Category::SideDish);
    }

    #[test]
    fn test_quoted_literal_cannot_be_customized() {
        let mut log = Vec::new();
        let err = parse_order_expression(&menu(), "\"insalatona\" & piselli", &mut log).unwrap_err();
        assert_eq!(
            err,
            OrderExpressionError::Combination(CombinationError {
                rejected: "Piselli".to_string()
            })
        );
    }

    #[test]
    fn test_lookup_errors() {
        let mut log = Vec::new();
        assert_eq!(
            parse_order_expression(&menu(), "fusilli + trippa", &mut log),
            Err(OrderExpressionError::NotFound("trippa".to_string()))
        );
        // the first group was resolved before failing
        assert_eq!(log.len(), 1);

        let err = parse_order_expression(&menu(), "pasta", &mut Vec::new()).unwrap_err();
        assert_eq!(
            err,
            OrderExpressionError::Ambiguous {
                query: "pasta".to_string(),
                candidates: vec!["Pasta al pesto".to_string(), "Pasta al pomodoro".to_string()],
            }
        );
        assert!(err.to_string().contains("Pasta al pesto\nPasta al pomodoro\n----"));
    }

    #[test]
    fn test_invalid_combination() {
        let err = parse_order_expression(&menu(), "fusilli & piselli", &mut Vec::new()).unwrap_err();
        assert!(matches!(err, OrderExpressionError::Combination(_)));
        assert!(err.to_string().starts_with("Errore nella personalizzazione: "));
    }

    #[test]
    fn test_empty_tokens() {
        for expression in ["", "fusilli + ", "scorfano & ", "\"\""] {
            assert_eq!(
                parse_order_expression(&menu(), expression, &mut Vec::new()),
                Err(OrderExpressionError::EmptyDish),
                "expression: {}",
                expression
            );
        }
    }

    #[test]
    fn test_escaped_separator() {
        let mut menu = menu();
        menu.add_row(MenuRow::new("Panino prosciutto & formaggio", Category::Sandwich));

        let choices =
            parse_order_expression(&menu, "prosciutto \\& formaggio", &mut Vec::new()).unwrap();
        assert_eq!(rendered(&choices), vec!["Panino prosciutto & formaggio"]);
    }
}
