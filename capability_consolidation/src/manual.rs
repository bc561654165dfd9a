/*!

This is the long-form manual for `capability_consolidation` and `millcap`.

## Input formats

Each uploaded file is the export of one site. The following formats are supported:
* `csv` Comma Separated Values, with a header row
* `excel` Excel workbooks (.xlsx), first worksheet or a named one

### Site names

The site is read from the file name, never from a column. The file name is lower-cased,
`_`, `-` and `.` become spaces, and the following rules are checked in order:

| file name contains    | site                           |
|-----------------------|--------------------------------|
| `pulp and paper`      | `Billingfors Paper and Shared` |
| `paper and shared`    | `Billingfors Paper and Shared` |
| `billingfors pulp`    | `Billingfors Pulp`             |
| `jonkoping`           | `Jönköping`                    |

A file that matches no rule keeps its file name as the site name.

### Columns

Export vintages spell the same column differently. The first spelling found with a
value is used:

| attribute                 | accepted headers                                                      |
|---------------------------|-----------------------------------------------------------------------|
| Role Area                 | `Role Area`, `Role`, `Role/Area`, `Position`                           |
| Criticality               | `Criticality`, `Role Criticality`                                      |
| Technical Knowledge       | `Technical Knowledge`, `Tech`, `Technical`                             |
| Experience                | `Experience`, `Exp`                                                    |
| Crisis Management         | `Crisis Management`, `Crisis`                                          |
| Leadership/Communication  | `Leadership/Communication`, `Leadership & Communication`, `LeadComm`, `Leadership` |
| Safety                    | `Safety`                                                              |
| Retention Risk            | `Retention Risk`, `Risk`                                               |

Headers are compared without regard to case or extra spaces. Scores may use a decimal
comma (`2,5`). Blank or non-numeric scores are left out of the average.

Every column whose header contains `capability` and `comment` (or `capability` and ends
with `-2024` or `_additional`) is a capability comment; the same holds for `retention`.
A cell may hold several comments separated by `|`.

```text
Role Area,Criticality,Technical Knowledge,Experience,Crisis Management,Leadership/Communication,Safety,Capability Comment,Retention Risk
Tech,3,4,3,4,2,4,Main note|Needs mentor,High
Tech,2,2,2,2,2,2,,High
```

## Output

One row per site and role area:
- every score is the mean of the values given for it, rounded to one decimal
- the capability average is the mean of the five rounded capability scores, rounded to
  one decimal
- the retention risk is the first letter of the last rating given (`High` gives `H`)
- comments are joined with line breaks, identical entries once

The capability level shown next to the average is `Low` below 2.0, `Medium` below 3.0
and `High` from 3.0.

## Configuration

`millcap` accepts a configuration file in JSON:

```json
{
  "sourceFiles": [
    { "filePath": "exports/billingfors_pulp.csv", "provider": "csv" },
    { "filePath": "exports/jonkoping.xlsx", "provider": "excel", "worksheetName": "Sheet1" }
  ],
  "storeDirectory": "store",
  "outputSettings": { "outputPath": "stdout", "format": "json" },
  "siteRules": [ { "pattern": "skogsvik", "site": "Skogsvik" } ],
  "columnAliases": { "Experience": ["Years in role"] }
}
```

All the fields are optional. Relative paths are read from the directory of the
configuration file. Site rules from the configuration are checked before the built-in
ones; column aliases are checked after the built-in spellings.

## Working data

`update` merges a consolidation into the store (one entry per site), keeping the notes
typed by users. `show`, `edit`, `export` and `scrub` work on the stored rows. The names
of decommissioned sites are removed from every text field each time rows are read,
written or exported.

 */
