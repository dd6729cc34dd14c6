// A small table of localized names and number symbols. Languages not listed
// here get the English table. This is intentionally not a CLDR replacement.

/// Month and weekday names along with the AM/PM markers for a language.
#[derive(Debug)]
pub struct Names {
    pub months: [&'static str; 12],
    pub months_short: [&'static str; 12],
    /// Starting with Monday.
    pub weekdays: [&'static str; 7],
    /// Starting with Monday.
    pub weekdays_short: [&'static str; 7],
    pub am: &'static str,
    pub pm: &'static str,
}

impl Names {
    pub fn for_language(language: &str) -> &'static Names {
        match language {
            "de" => &GERMAN,
            "fr" => &FRENCH,
            "es" => &SPANISH,
            _ => &ENGLISH,
        }
    }
}

static ENGLISH: Names = Names {
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct",
        "Nov", "Dec",
    ],
    weekdays: [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ],
    weekdays_short: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    am: "AM",
    pm: "PM",
};

static GERMAN: Names = Names {
    months: [
        "Januar",
        "Februar",
        "März",
        "April",
        "Mai",
        "Juni",
        "Juli",
        "August",
        "September",
        "Oktober",
        "November",
        "Dezember",
    ],
    months_short: [
        "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.",
        "Sept.", "Okt.", "Nov.", "Dez.",
    ],
    weekdays: [
        "Montag",
        "Dienstag",
        "Mittwoch",
        "Donnerstag",
        "Freitag",
        "Samstag",
        "Sonntag",
    ],
    weekdays_short: ["Mo.", "Di.", "Mi.", "Do.", "Fr.", "Sa.", "So."],
    am: "AM",
    pm: "PM",
};

static FRENCH: Names = Names {
    months: [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ],
    months_short: [
        "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août",
        "sept.", "oct.", "nov.", "déc.",
    ],
    weekdays: [
        "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi",
        "dimanche",
    ],
    weekdays_short: ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."],
    am: "AM",
    pm: "PM",
};

static SPANISH: Names = Names {
    months: [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ],
    months_short: [
        "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct",
        "nov", "dic",
    ],
    weekdays: [
        "lunes",
        "martes",
        "miércoles",
        "jueves",
        "viernes",
        "sábado",
        "domingo",
    ],
    weekdays_short: ["lun", "mar", "mié", "jue", "vie", "sáb", "dom"],
    am: "a. m.",
    pm: "p. m.",
};

/// The separators used when printing decimal numbers.
#[derive(Debug)]
pub struct NumberSymbols {
    pub decimal: char,
    pub group: char,
    pub minus: char,
    pub percent: char,
}

impl NumberSymbols {
    pub fn for_language(language: &str) -> &'static NumberSymbols {
        static COMMA_GROUPED: NumberSymbols = NumberSymbols {
            decimal: '.',
            group: ',',
            minus: '-',
            percent: '%',
        };
        static DOT_GROUPED: NumberSymbols = NumberSymbols {
            decimal: ',',
            group: '.',
            minus: '-',
            percent: '%',
        };
        static SPACE_GROUPED: NumberSymbols = NumberSymbols {
            decimal: ',',
            group: '\u{202F}',
            minus: '-',
            percent: '%',
        };
        match language {
            "de" | "es" | "it" | "nl" | "pt" => &DOT_GROUPED,
            "fr" => &SPACE_GROUPED,
            _ => &COMMA_GROUPED,
        }
    }
}
