use crate::core::BrowserSession;
use crate::domain::model::{BankAccount, Person};
use crate::utils::error::Result;

/// Writes person and bank data into the reservation form.
///
/// The form repeats its occupant fields per person. The first person's inputs
/// carry no suffix (`Vorname`), later persons carry their number (`Vorname2`).
pub struct FormFiller<'a> {
    session: &'a mut dyn BrowserSession,
}

impl<'a> FormFiller<'a> {
    pub fn new(session: &'a mut dyn BrowserSession) -> Self {
        Self { session }
    }

    /// `index` None for the first person, Some(2) for the second.
    pub async fn fill_personal_details(&mut self, person: &Person, index: Option<u8>) -> Result<()> {
        let suffix = field_suffix(index);
        tracing::debug!("Filling personal details of {} (suffix '{}')", person, suffix);

        self.session
            .check(&format!(
                r#"input[name="Geschlecht{suffix}"][id="{}"]"#,
                person.gender_code()
            ))
            .await?;

        self.fill_input("Vorname", &suffix, &person.first_name).await?;
        self.fill_input("Name", &suffix, &person.last_name).await?;
        self.fill_input("Strasse", &suffix, &person.address).await?;
        self.fill_input("Ort", &suffix, &person.postal_city()).await?;
        self.session
            .select(&format!(r#"select[name="Statusorig{suffix}"]"#), &person.status)
            .await?;
        self.fill_input("Matnr", &suffix, &person.student_number).await?;
        self.fill_input("Mail", &suffix, &person.email).await?;
        self.fill_input("Tel", &suffix, &person.phone).await?;

        // 只有部分場地的表單需要生日
        let birthdate = input_selector("Geburtsdatum", &suffix);
        if self.session.is_visible(&birthdate).await? {
            self.session.fill(&birthdate, &person.birthdate).await?;
        } else {
            tracing::debug!("Birthdate field not shown, skipping");
        }

        Ok(())
    }

    pub async fn fill_bank_details(&mut self, account: &BankAccount) -> Result<()> {
        self.session
            .fill(r#"input[name="iban"]"#, &account.iban)
            .await?;
        self.session.fill(r#"input[name="bic"]"#, &account.bic).await
    }

    async fn fill_input(&mut self, name: &str, suffix: &str, value: &str) -> Result<()> {
        self.session.fill(&input_selector(name, suffix), value).await
    }
}

fn field_suffix(index: Option<u8>) -> String {
    index.map(|i| i.to_string()).unwrap_or_default()
}

fn input_selector(name: &str, suffix: &str) -> String {
    format!(r#"input[name="{name}{suffix}"]"#)
}
