//! Sample judgment sentences shared by tests.

pub const FRENCH: &str = "La Cour de cassation rejette le pourvoi et condamne le demandeur aux dépens. \
    Les juges d'appel ont légalement justifié leur décision sur la base de l'article 1382 du Code civil.";

pub const DUTCH: &str = "Het Hof verwerpt het cassatieberoep en veroordeelt de eiser in de kosten van het geding. \
    De appelrechters hebben hun beslissing naar recht verantwoord op grond van artikel 1382 van het Burgerlijk Wetboek.";

pub const GERMAN: &str = "Der Kassationshof weist die Kassationsbeschwerde zurück und verurteilt den Kläger \
    zu den Kosten des Verfahrens. Das Urteil ist nicht zu beanstanden.";

pub const SPANISH: &str = "El Tribunal Supremo desestima el recurso de casación y condena al recurrente \
    al pago de las costas. Los jueces de apelación justificaron legalmente su decisión.";

pub const ITALIAN: &str = "La Corte di cassazione rigetta il ricorso e condanna il ricorrente al pagamento \
    delle spese processuali. I giudici d'appello hanno motivato correttamente la loro decisione.";
