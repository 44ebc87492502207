//!
//! Function-local scratch arrays
//!
//! An array such as `iSymbol` grows while the function body is generated;
//! its declaration is written as a placeholder at the top of the function
//! and completed with the final size when the function ends.
//!
use crate::assembly::{Document, TextId};
use crate::error::Result;

#[derive(Debug, Clone)]
struct Array {
    name: String,
    ctype: String,
    declaration: TextId,
    size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Temporaries {
    arrays: Vec<Array>,
    scalars: Vec<String>,
}

impl Temporaries {
    ///
    /// Make `name` hold at least `size` elements.
    ///
    pub fn ensure(&mut self, doc: &mut Document, name: &str, ctype: &str, size: usize) -> Result<()> {
        match self.arrays.iter_mut().find(|a| a.name == name) {
            Some(a) => a.size = a.size.max(size),
            None => {
                doc.open_at_init("declare", "function")?;
                let declaration = doc.add("");
                doc.close("declare")?;
                self.arrays.push(Array {
                    name: name.to_string(),
                    ctype: ctype.to_string(),
                    declaration,
                    size,
                });
            }
        }
        Ok(())
    }
    ///
    /// Declare a scalar once per function.
    ///
    pub fn scalar(&mut self, doc: &mut Document, name: &str, declaration: &str) -> Result<()> {
        if !self.scalars.iter().any(|s| s == name) {
            doc.add_init("function", declaration)?;
            self.scalars.push(name.to_string());
        }
        Ok(())
    }
    pub fn size(&self, name: &str) -> usize {
        self.arrays
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.size)
            .unwrap_or(0)
    }
    ///
    /// Write the final declarations.
    ///
    pub fn finish(&self, doc: &mut Document) {
        for a in self.arrays.iter() {
            doc.replace(
                a.declaration,
                format!("{} {}[{}];", a.ctype, a.name, a.size.max(1)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_get_final_size() {
        let mut doc = Document::new();
        let mut temps = Temporaries::default();
        doc.open("function").unwrap();
        temps.ensure(&mut doc, "iSymbol", "int", 1).unwrap();
        doc.add("iSymbol[0] = 1;");
        temps.ensure(&mut doc, "iSymbol", "int", 3).unwrap();
        temps.ensure(&mut doc, "iSymbol", "int", 2).unwrap();
        temps.scalar(&mut doc, "i", "int i;").unwrap();
        temps.scalar(&mut doc, "i", "int i;").unwrap();
        temps.finish(&mut doc);
        doc.close("function").unwrap();
        let s = doc.render("").unwrap();
        assert_eq!(temps.size("iSymbol"), 3);
        assert!(s.contains("int iSymbol[3];"));
        assert_eq!(s.matches("int i;").count(), 1);
        assert!(s.find("int iSymbol[3];").unwrap() < s.find("iSymbol[0] = 1;").unwrap());
    }
}
